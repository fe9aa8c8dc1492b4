//! # Lecture Room クライアント
//!
//! 埋め込みミーティング画面の参加処理。
//!
//! 署名エンドポイントから参加トークンを取得し、表示コンテナへの参照と一緒に
//! ベンダークライアントへ渡す。結果は小さな状態タグ（[`MeetingStatus`]）と
//! 1つのエラーメッセージとして保持し、操作ボタンの有効・無効に使う。
//!
//! ## モジュール
//! - `options` — 起動オプション（クエリ → 環境変数 → デフォルト）
//! - `signature` — 署名エンドポイント クライアント
//! - `status` — 状態タグと操作可否
//! - `vendor` — ベンダークライアントのトレイトとヘッドレス実装
//! - `session` — 参加・退出・破棄の順序制御

pub mod error;
pub mod options;
pub mod session;
pub mod signature;
pub mod status;
pub mod vendor;

pub use error::{format_error, ClientError};
pub use options::LaunchOptions;
pub use session::{MeetingSession, Panel};
pub use signature::{FetchedSignature, SignatureClient};
pub use status::{Affordances, BadgeVariant, MeetingStatus};
pub use vendor::headless::HeadlessClient;
pub use vendor::{DisplayContainers, VendorClient, VendorError, VendorEvent, ViewType};
