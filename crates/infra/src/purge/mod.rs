//! # ギルドデータ削除基盤
//!
//! Bot がギルドから削除された際に、そのギルドに属する全テーブルの行を
//! 依存順に、単一トランザクションで削除するための基盤モジュール。
//!
//! ## 概要
//!
//! 削除対象は [`PurgeDescriptor`]（依存グラフ記述子）として宣言する。
//! 親テーブルへの外部キー経由でスコープされる「連結テーブル」を先に、
//! `guild_id` カラムを直接持つ「直接テーブル」を後に削除することで、
//! サブクエリ結合の親行が削除前であることを保証する。
//!
//! [`GuildPurger`] が記述子を歩き、テーブルごとの削除件数を集計して
//! コミットまたはロールバックを単位として実行する。
//!
//! ## 原子性
//!
//! 原子性の単位はテーブル単位ではなく purge 全体。60 テーブル中
//! 40 番目で失敗した場合、ストアは purge 開始前の状態に戻る。

mod descriptor;
mod executor;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
mod observer;
mod postgres;
mod store;

pub use descriptor::{DescriptorError, DirectTable, LinkedTable, PurgeDescriptor};
pub use executor::GuildPurger;
pub use observer::{NoopObserver, PurgeObserver, TracingObserver};
pub use postgres::PgPurgeStore;
use serde::Serialize;
pub use store::{PurgeStore, PurgeTx, TableDelete};
use thiserror::Error;
use ticketflow_domain::guild::GuildId;

use crate::error::InfraError;

/// 1 テーブル分の削除結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDeletion {
    /// 削除対象のテーブル名
    pub table:        &'static str,
    /// 削除された行数
    pub rows_deleted: u64,
}

/// ギルドデータ一括削除の結果レポート
///
/// 実行順のテーブル別削除件数を保持する。purge 呼び出しごとに新しく
/// 生成され、返却後は不変。成功経路でのみ存在する（失敗は
/// [`PurgeError`] として返るため、「成功フラグ」は型で表現される）。
#[derive(Debug, Clone, Serialize)]
pub struct PurgeReport {
    /// 削除対象のギルド
    pub guild_id:  GuildId,
    /// テーブルごとの削除件数（実行順）
    pub per_table: Vec<TableDeletion>,
}

impl PurgeReport {
    /// 全テーブルの削除件数の合計
    pub fn total_rows_deleted(&self) -> u64 {
        self.per_table.iter().map(|t| t.rows_deleted).sum()
    }
}

/// ギルドデータ削除で発生するエラー
///
/// 失敗した削除文にはテーブル名を必ず付与する。テーブル名は
/// スキーマずれ（記述子の更新漏れ）の診断に使う。
#[derive(Debug, Error)]
pub enum PurgeError {
    /// トランザクションを開始できなかった
    ///
    /// ロールバック対象は存在しない。
    #[error("トランザクションを開始できません: {0}")]
    Connection(#[source] InfraError),

    /// 削除文が失敗し、ロールバックは成功した
    ///
    /// ストアは purge 開始前の状態に戻っている。
    #[error("{table} からの削除に失敗しました: {source}")]
    Statement {
        /// 失敗した削除文のテーブル名
        table:  &'static str,
        #[source]
        source: InfraError,
    },

    /// 削除文が失敗し、ロールバックにも失敗した
    ///
    /// 元の削除文エラーを一次原因（`source()`）として報告する。
    #[error(
        "{table} からの削除に失敗し、ロールバックにも失敗しました: \
         {statement_error}（ロールバック: {rollback_error}）"
    )]
    Rollback {
        /// 失敗した削除文のテーブル名
        table:           &'static str,
        /// 一次原因となった削除文エラー
        #[source]
        statement_error: Box<InfraError>,
        /// ロールバック自体のエラー
        rollback_error:  Box<InfraError>,
    },

    /// 全削除文は成功したがコミットに失敗した
    ///
    /// データ状態は不定（コミット失敗時のロールバック挙動はストア依存）。
    /// 削除は冪等なので、呼び出し側は purge 全体を安全に再実行できる。
    #[error("コミットに失敗しました: {0}")]
    Commit(#[source] InfraError),
}

impl PurgeError {
    /// 失敗した削除文のテーブル名を返す
    ///
    /// `Connection` / `Commit` はテーブルに紐付かないため `None`。
    pub fn failed_table(&self) -> Option<&'static str> {
        match self {
            Self::Statement { table, .. } | Self::Rollback { table, .. } => Some(*table),
            Self::Connection(_) | Self::Commit(_) => None,
        }
    }
}
