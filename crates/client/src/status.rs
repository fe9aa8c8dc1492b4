//! # ミーティング状態
//!
//! 操作ボタンの有効・無効を決めるための状態タグと表示用ヘルパー。

use serde::Serialize;

/// ミーティングの状態。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MeetingStatus {
    /// 未初期化
    #[default]
    Idle,
    /// ベンダークライアント初期化中
    Initializing,
    /// 初期化完了、参加可能
    Ready,
    /// 参加処理中（署名取得〜ベンダー参加完了まで）
    Joining,
    /// 参加中
    InMeeting,
    /// 退出済み、またはミーティング終了
    Ended,
    /// 直前の操作が失敗
    Error,
}

/// ステータスバッジの表示種別。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeVariant {
    Default,
    Secondary,
    Destructive,
    Outline,
}

impl MeetingStatus {
    /// ワイヤ・ログ上の識別子
    pub fn as_str(self) -> &'static str {
        match self {
            MeetingStatus::Idle => "idle",
            MeetingStatus::Initializing => "initializing",
            MeetingStatus::Ready => "ready",
            MeetingStatus::Joining => "joining",
            MeetingStatus::InMeeting => "in-meeting",
            MeetingStatus::Ended => "ended",
            MeetingStatus::Error => "error",
        }
    }

    /// バッジに表示するラベル
    pub fn label(self) -> &'static str {
        match self {
            MeetingStatus::Idle => "Idle",
            MeetingStatus::Initializing => "Initializing",
            MeetingStatus::Ready => "Ready",
            MeetingStatus::Joining => "Joining",
            MeetingStatus::InMeeting => "Live",
            MeetingStatus::Ended => "Ended",
            MeetingStatus::Error => "Error",
        }
    }

    pub fn badge(self) -> BadgeVariant {
        match self {
            MeetingStatus::Idle | MeetingStatus::Ended => BadgeVariant::Outline,
            MeetingStatus::Initializing | MeetingStatus::Ready | MeetingStatus::Joining => {
                BadgeVariant::Secondary
            }
            MeetingStatus::InMeeting => BadgeVariant::Default,
            MeetingStatus::Error => BadgeVariant::Destructive,
        }
    }
}

impl std::fmt::Display for MeetingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 状態から導かれる操作の可否。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Affordances {
    /// 「参加」ボタン
    pub can_join: bool,
    /// ミュート・ミュート解除・音声停止・表示切替・退出
    pub in_meeting: bool,
}

impl Affordances {
    pub fn for_status(status: MeetingStatus, has_meeting_number: bool) -> Self {
        Self {
            can_join: has_meeting_number
                && matches!(status, MeetingStatus::Ready | MeetingStatus::Ended),
            in_meeting: matches!(status, MeetingStatus::InMeeting | MeetingStatus::Joining),
        }
    }
}
