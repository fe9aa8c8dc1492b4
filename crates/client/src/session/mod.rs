//! # ミーティングセッション
//!
//! ベンダークライアント1つと、状態タグ1つ、エラーメッセージ1つを持つ。
//!
//! ## 処理フロー
//! 1. `initialize` — イベント購読、ベンダークライアント初期化（Ready）。自動参加なら続けて `join`
//! 2. `join` — 署名取得 → ベンダークライアントへ参加情報を渡す（InMeeting）
//! 3. `leave` / 接続状態 `Closed` の通知 — Ended
//! 4. `teardown` — 購読解除、退出の試行、ベンダークライアント破棄（1回のみ）
//!
//! 失敗はすべて1つの表示用メッセージに変換され、自動再試行はしない。

use lecture_types::MeetingNumber;

use crate::error::format_error;
use crate::options::LaunchOptions;
use crate::signature::SignatureClient;
use crate::status::{Affordances, MeetingStatus};
use crate::vendor::{
    ConnectionState, DisplayContainers, EventSubscription, InitOptions, JoinPayload, VendorClient,
    VendorEvent, ViewType, RESOURCES_BUTTON,
};


/// サイドパネルのタブ
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Panel {
    #[default]
    Chat,
    Participants,
    Resources,
}

/// ミーティングセッション。
pub struct MeetingSession<V: VendorClient> {
    vendor: V,
    options: LaunchOptions,
    containers: DisplayContainers,
    signatures: SignatureClient,
    status: MeetingStatus,
    error: Option<String>,
    panel: Panel,
    initialized: bool,
    subscription: Option<EventSubscription>,
    torn_down: bool,
}

impl<V: VendorClient> MeetingSession<V> {
    pub fn new(
        vendor: V,
        options: LaunchOptions,
        containers: DisplayContainers,
        signatures: SignatureClient,
    ) -> Self {
        Self {
            vendor,
            options,
            containers,
            signatures,
            status: MeetingStatus::Idle,
            error: None,
            panel: Panel::default(),
            initialized: false,
            subscription: None,
            torn_down: false,
        }
    }

    pub fn status(&self) -> MeetingStatus {
        self.status
    }

    /// 表示中のエラーメッセージ
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn panel(&self) -> Panel {
        self.panel
    }

    pub fn options(&self) -> &LaunchOptions {
        &self.options
    }

    pub fn vendor(&self) -> &V {
        &self.vendor
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// 現在の状態で可能な操作
    pub fn affordances(&self) -> Affordances {
        Affordances::for_status(self.status, !self.options.meeting_number.trim().is_empty())
    }

    /// エラーバナーを閉じる。
    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn select_panel(&mut self, panel: Panel) {
        self.panel = panel;
    }

    fn set_status(&mut self, status: MeetingStatus) {
        if self.status != status {
            tracing::info!(from = %self.status, to = %status, "ミーティング状態が変化");
        }
        self.status = status;
    }

    fn fail(&mut self, message: String) {
        tracing::warn!(error = %message, "ミーティング操作に失敗");
        self.set_status(MeetingStatus::Error);
        self.error = Some(message);
    }

    /// ベンダークライアントを初期化する。自動参加が有効なら続けて参加する。
    pub async fn initialize(&mut self) -> MeetingStatus {
        if self.torn_down {
            return self.status;
        }

        self.set_status(MeetingStatus::Initializing);
        self.error = None;

        if self.subscription.is_none() {
            self.subscription = Some(self.vendor.subscribe());
        }

        let init_options = InitOptions::new(self.containers.clone(), &self.options.sdk_version);
        if let Err(e) = self.vendor.init(&init_options).await {
            self.fail(format_error("Meeting client init failed", e));
            return self.status;
        }

        self.initialized = true;
        self.set_status(MeetingStatus::Ready);

        if self.options.auto_join {
            self.join().await;
        }
        self.status
    }

    /// 署名を取得してミーティングに参加する。
    ///
    /// 署名の取得に失敗した場合、ベンダークライアントの参加は呼ばない。
    pub async fn join(&mut self) -> MeetingStatus {
        if self.torn_down {
            return self.status;
        }
        if !self.initialized {
            self.error = Some("Meeting client is not ready yet.".to_string());
            return self.status;
        }
        if self.options.meeting_number.trim().is_empty() {
            self.error = Some("Missing meeting number.".to_string());
            return self.status;
        }
        if self.options.signature_endpoint.trim().is_empty() {
            self.error = Some("Missing signature endpoint.".to_string());
            return self.status;
        }

        let meeting_number = match MeetingNumber::parse(&self.options.meeting_number) {
            Ok(mn) => mn,
            Err(e) => {
                self.error = Some(format_error("Invalid meeting number", e));
                return self.status;
            }
        };

        self.set_status(MeetingStatus::Joining);
        self.error = None;

        let fetched = match self
            .signatures
            .fetch(&self.options.signature_endpoint, &meeting_number, self.options.role)
            .await
        {
            Ok(fetched) => fetched,
            Err(e) => {
                self.fail(format_error("Join meeting failed", e));
                return self.status;
            }
        };

        let payload = JoinPayload {
            signature: fetched.signature,
            meeting_number: meeting_number.to_string(),
            password: self.options.password.clone(),
            user_name: self.options.user_name.clone(),
            sdk_key: fetched.sdk_key,
        };

        match self.vendor.join(&payload).await {
            Ok(()) => self.set_status(MeetingStatus::InMeeting),
            Err(e) => self.fail(format_error("Join meeting failed", e)),
        }
        self.status
    }

    /// ミーティングから退出する。
    pub async fn leave(&mut self) -> MeetingStatus {
        if self.torn_down || !self.initialized {
            return self.status;
        }
        self.error = None;

        match self.vendor.leave().await {
            Ok(()) => self.set_status(MeetingStatus::Ended),
            Err(e) => self.fail(format_error("Leave meeting failed", e)),
        }
        self.status
    }

    /// ミュート（`true`）・解除（`false`）。失敗しても状態は変えない。
    pub async fn mute(&mut self, mute: bool) {
        if self.torn_down || !self.initialized {
            return;
        }
        self.error = None;
        if let Err(e) = self.vendor.mute(mute).await {
            self.error = Some(format_error("Toggle mute failed", e));
        }
    }

    /// 音声を停止する。失敗しても状態は変えない。
    pub async fn stop_audio(&mut self) {
        if self.torn_down || !self.initialized {
            return;
        }
        self.error = None;
        if let Err(e) = self.vendor.stop_audio().await {
            self.error = Some(format_error("Stop audio failed", e));
        }
    }

    /// 映像レイアウトを切り替える。失敗しても状態は変えない。
    pub async fn set_view(&mut self, view: ViewType) {
        if self.torn_down || !self.initialized {
            return;
        }
        self.error = None;
        if let Err(e) = self.vendor.set_view(view).await {
            self.error = Some(format_error("Change view failed", e));
        }
    }

    /// ベンダークライアントからの通知を反映する。破棄後は無視する。
    pub fn handle_event(&mut self, event: VendorEvent) {
        if self.torn_down {
            return;
        }
        match event {
            VendorEvent::ConnectionChange(ConnectionState::Closed) => {
                self.set_status(MeetingStatus::Ended);
            }
            VendorEvent::ConnectionChange(state) => {
                tracing::debug!(state = ?state, "接続状態の通知");
            }
            VendorEvent::ToolbarButton(text) if text == RESOURCES_BUTTON => {
                self.panel = Panel::Resources;
            }
            VendorEvent::ToolbarButton(text) => {
                tracing::debug!(button = %text, "未知のツールバーボタン");
            }
        }
    }

    /// 届いている通知をすべて反映し、反映した件数を返す。
    pub fn pump_events(&mut self) -> usize {
        let mut pending = Vec::new();
        if let Some(sub) = self.subscription.as_mut() {
            while let Ok(event) = sub.events.try_recv() {
                pending.push(event);
            }
        }
        let count = pending.len();
        for event in pending {
            self.handle_event(event);
        }
        count
    }

    /// 次の通知を待って反映する。購読が無い、または切断された場合は `None`。
    pub async fn next_event(&mut self) -> Option<VendorEvent> {
        let event = self.subscription.as_mut()?.events.recv().await?;
        self.handle_event(event.clone());
        Some(event)
    }

    /// 埋め込み表示を破棄する。
    ///
    /// 参加の有無に関わらず、購読解除・退出の試行・クライアント破棄を1回だけ行う。
    /// 2回目以降の呼び出しは何もしない。
    pub async fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        if let Some(sub) = self.subscription.take() {
            self.vendor.unsubscribe(sub.id);
        }
        if let Err(e) = self.vendor.leave().await {
            tracing::debug!(error = %e, "破棄時の退出に失敗（無視）");
        }
        self.vendor.destroy();
        tracing::info!(status = %self.status, "ミーティングクライアントを破棄しました");
    }
}

impl<V: VendorClient> Drop for MeetingSession<V> {
    fn drop(&mut self) {
        if !self.torn_down {
            tracing::warn!("teardown を呼ばずにミーティングセッションが破棄されました");
        }
    }
}
