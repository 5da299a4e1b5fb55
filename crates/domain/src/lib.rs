//! # TicketFlow ドメイン層
//!
//! ビジネスロジックの中核を担うドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! このクレートは識別子と値オブジェクトのみを提供し、
//! インフラ層（DB、外部サービス）には一切依存しない。
//! テーブルアクセサやクエリはインフラ層の責務。
//!
//! ## 依存関係の方向
//!
//! ```text
//! infra → domain
//! ```
//!
//! ## モジュール構成
//!
//! - [`guild`] - ギルド（Discord サーバー）の識別子
//!
//! ## 使用例
//!
//! ```rust
//! use ticketflow_domain::guild::GuildId;
//!
//! let guild_id = GuildId::new(826720002092630046);
//! println!("ギルド: {}", guild_id);
//! ```

pub mod guild;
