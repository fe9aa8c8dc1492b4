//! # Lecture Room CLI
//!
//! ## サブコマンド
//! - `issue` — 環境変数の資格情報で参加トークンをローカル発行
//! - `fetch` — 稼働中のGatewayから署名を取得
//! - `inspect` — 参加トークンのクレームを表示（`--secret` 指定時は検証）
//! - `join` — ヘッドレス ベンダークライアントで参加処理を通しで実行

use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use lecture_client::{
    DisplayContainers, FetchedSignature, HeadlessClient, LaunchOptions, MeetingSession,
    SignatureClient,
};
use lecture_token::{peek_claims, TokenIssuer, TokenVerifier};
use lecture_types::{
    JoinTokenClaims, MeetingNumber, Role, SignatureResponse, DEFAULT_SIGNATURE_PATH,
};
use reqwest::Url;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lecture-cli", about = "Lecture Room join token tooling")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 参加トークンをローカルで発行する
    Issue {
        #[arg(long)]
        meeting: MeetingNumber,
        #[arg(long, default_value = "0", value_parser = parse_role)]
        role: Role,
        #[arg(long, env = "ZOOM_CLIENT_ID")]
        client_id: Option<String>,
        #[arg(long, env = "ZOOM_CLIENT_SECRET", hide_env_values = true)]
        client_secret: Option<String>,
    },
    /// Gatewayから署名を取得する
    Fetch {
        /// GatewayのベースURL（`/` で終わる）、または署名エンドポイントの絶対URL
        #[arg(long)]
        endpoint: Url,
        #[arg(long)]
        meeting: MeetingNumber,
        #[arg(long, default_value = "0", value_parser = parse_role)]
        role: Role,
    },
    /// 参加トークンのクレームを表示する
    Inspect {
        token: String,
        /// 指定すると署名と有効期間を検証する
        #[arg(long, env = "ZOOM_CLIENT_SECRET", hide_env_values = true)]
        secret: Option<String>,
    },
    /// ヘッドレス ベンダークライアントで参加処理を実行する
    Join(JoinArgs),
}

/// `join` の引数。省略した項目はページURLのクエリ、環境変数、デフォルトの順で決まる。
#[derive(Args, Debug, Clone)]
struct JoinArgs {
    /// ページのURL（相対エンドポイントの解決とクエリパラメータに使う）
    #[arg(long)]
    page: Url,
    /// 署名エンドポイント
    #[arg(long)]
    endpoint: Option<String>,
    #[arg(long)]
    meeting: Option<String>,
    #[arg(long)]
    password: Option<String>,
    #[arg(long)]
    user_name: Option<String>,
    #[arg(long, value_parser = parse_role)]
    role: Option<Role>,
    /// 参加後、指定秒数待ってから退出する
    #[arg(long)]
    leave_after: Option<u64>,
}

fn parse_role(raw: &str) -> Result<Role, String> {
    let value: i64 = raw.parse().map_err(|e| format!("{e}"))?;
    Role::try_from(value).map_err(|e| e.to_string())
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// issue / inspect
// ---------------------------------------------------------------------------

fn run_issue(
    meeting: &MeetingNumber,
    role: Role,
    client_id: Option<&str>,
    client_secret: Option<&str>,
) -> anyhow::Result<SignatureResponse> {
    let issuer = TokenIssuer::from_parts(client_id, client_secret)?;
    Ok(issuer.issue(meeting, role)?.into_response())
}

fn run_inspect(token: &str, secret: Option<&str>) -> anyhow::Result<JoinTokenClaims> {
    let claims = match secret {
        Some(secret) => TokenVerifier::new(secret)
            .verify(token)
            .context("参加トークンの検証に失敗")?,
        None => {
            tracing::warn!("シークレット未指定のため署名を検証していません");
            peek_claims(token)?
        }
    };
    Ok(claims)
}

// ---------------------------------------------------------------------------
// fetch
// ---------------------------------------------------------------------------

/// 署名を要求するURL。
///
/// パスが `/` で終わる場合はGatewayのベースURLとみなし、その下のデフォルトパスを使う。
fn signature_target(endpoint: &Url) -> anyhow::Result<Url> {
    if endpoint.path().ends_with('/') {
        endpoint
            .join(DEFAULT_SIGNATURE_PATH.trim_start_matches('/'))
            .with_context(|| format!("署名エンドポイントを解決できません: {endpoint}"))
    } else {
        Ok(endpoint.clone())
    }
}

async fn run_fetch(
    endpoint: &Url,
    meeting: &MeetingNumber,
    role: Role,
) -> anyhow::Result<FetchedSignature> {
    let target = signature_target(endpoint)?;
    let client = SignatureClient::new(None)?;
    let fetched = client
        .fetch(target.as_str(), meeting, role)
        .await
        .context("署名の取得に失敗")?;
    Ok(fetched)
}

// ---------------------------------------------------------------------------
// join
// ---------------------------------------------------------------------------

/// `join` の結果表示
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JoinReport {
    status_trail: Vec<&'static str>,
    final_status: &'static str,
    label: &'static str,
    error: Option<String>,
    vendor_calls: Vec<String>,
}

async fn run_join(args: JoinArgs) -> anyhow::Result<JoinReport> {
    let mut options = LaunchOptions::from_url(&args.page);
    if let Some(endpoint) = args.endpoint {
        options.signature_endpoint = endpoint;
    }
    if let Some(meeting) = args.meeting {
        options.meeting_number = meeting;
    }
    if let Some(password) = args.password {
        options.password = password;
    }
    if let Some(user_name) = args.user_name {
        options.user_name = user_name;
    }
    if let Some(role) = args.role {
        options.role = role;
    }
    // CLIでは明示的に join を呼ぶ
    options.auto_join = false;

    let vendor = HeadlessClient::new();
    let signatures = SignatureClient::new(Some(args.page))?;
    let mut session = MeetingSession::new(
        vendor.clone(),
        options,
        DisplayContainers::default(),
        signatures,
    );

    let mut trail = vec![session.status().as_str()];
    trail.push(session.initialize().await.as_str());
    trail.push(session.join().await.as_str());

    if let Some(secs) = args.leave_after {
        if session.affordances().in_meeting {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            trail.push(session.leave().await.as_str());
        }
    }

    // 退出時の Closed 通知を反映する
    session.pump_events();

    let final_status = session.status();
    let error = session.error().map(str::to_string);
    session.teardown().await;

    Ok(JoinReport {
        status_trail: trail,
        final_status: final_status.as_str(),
        label: final_status.label(),
        error,
        vendor_calls: vendor.calls().iter().map(|c| format!("{c:?}")).collect(),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Issue {
            meeting,
            role,
            client_id,
            client_secret,
        } => {
            let response = run_issue(
                &meeting,
                role,
                client_id.as_deref(),
                client_secret.as_deref(),
            )?;
            print_json(&response)?;
        }
        Command::Fetch {
            endpoint,
            meeting,
            role,
        } => {
            let fetched = run_fetch(&endpoint, &meeting, role).await?;
            print_json(&serde_json::json!({
                "signature": fetched.signature,
                "clientId": fetched.sdk_key,
            }))?;
        }
        Command::Inspect { token, secret } => {
            print_json(&run_inspect(&token, secret.as_deref())?)?;
        }
        Command::Join(args) => {
            let report = run_join(args).await?;
            print_json(&report)?;
            if report.error.is_some() {
                anyhow::bail!("join did not complete");
            }
        }
    }

    Ok(())
}
