//! # TicketFlow インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 設計方針
//!
//! このクレートはデータストアの詳細をカプセル化し、ドメイン層を
//! インフラの変更から保護する。個別テーブルの CRUD アクセサは
//! このリポジトリの対象外で、ここにはギルド単位のデータライフサイクル
//! （退会時の一括削除）だけが置かれる。
//!
//! ## 責務
//!
//! - **データベース接続**: PostgreSQL への接続プール管理
//! - **ギルドデータ削除**: Bot がギルドから削除された際の全テーブル横断削除
//!
//! ## 依存関係
//!
//! ```text
//! infra → domain
//! ```
//!
//! インフラ層は `domain` に依存する。
//! ドメイン層はインフラ層に依存しない（依存性逆転の原則）。
//!
//! ## モジュール構成
//!
//! - [`db`] - PostgreSQL データベース接続管理
//! - [`error`] - インフラ層エラー定義
//! - [`purge`] - ギルドデータ削除基盤（cascading purge）
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use ticketflow_domain::guild::GuildId;
//! use ticketflow_infra::{db, purge::{GuildPurger, PgPurgeStore}};
//!
//! async fn on_guild_removed(guild_id: GuildId) -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = db::create_pool("postgres://localhost/ticketflow").await?;
//!     let purger = GuildPurger::new(Arc::new(PgPurgeStore::new(pool)));
//!
//!     let report = purger.purge(guild_id).await?;
//!     println!("{} 行を削除", report.total_rows_deleted());
//!     Ok(())
//! }
//! ```

pub mod db;
pub mod error;
pub mod purge;

pub use error::InfraError;
