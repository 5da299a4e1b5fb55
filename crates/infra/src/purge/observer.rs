//! # purge 観測シンク
//!
//! テーブルごとの削除件数の報告先。特定のロギングライブラリへの
//! ハード依存を避けるため、呼び出し側が注入するインターフェースとする。
//! 既定実装は [`TracingObserver`]。

use ticketflow_domain::guild::GuildId;

/// purge の進行を受け取る観測シンク
///
/// 各イベントはトランザクションのコミット前に発火する。報告される
/// 行数は文の実行結果であり、purge 全体が失敗した場合は最終的に
/// ロールバックされている点に注意。
pub trait PurgeObserver: Send + Sync {
    /// purge の開始
    fn on_purge_started(&self, _guild_id: GuildId) {}

    /// 1 テーブル分の削除文が完了した
    fn on_table_purged(&self, guild_id: GuildId, table: &'static str, rows_deleted: u64);

    /// 全テーブルの削除とコミットが完了した
    fn on_purge_completed(&self, _guild_id: GuildId, _total_rows_deleted: u64) {}
}

/// tracing へ構造化ログを出力する既定の観測シンク
///
/// 削除行数が 0 のテーブルは出力しない（数十テーブルの大半は
/// 0 件であり、ログを意味のあるイベントに絞る）。
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl PurgeObserver for TracingObserver {
    fn on_purge_started(&self, guild_id: GuildId) {
        tracing::info!(%guild_id, "ギルドデータの削除を開始");
    }

    fn on_table_purged(&self, guild_id: GuildId, table: &'static str, rows_deleted: u64) {
        if rows_deleted > 0 {
            tracing::info!(%guild_id, table, rows_deleted, "テーブルから行を削除");
        }
    }

    fn on_purge_completed(&self, guild_id: GuildId, total_rows_deleted: u64) {
        tracing::info!(%guild_id, total_rows_deleted, "ギルドデータの削除が完了");
    }
}

/// 何も報告しない観測シンク
///
/// 件数の報告を別経路（レポートの直接利用など）で行う呼び出し側向け。
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PurgeObserver for NoopObserver {
    fn on_table_purged(&self, _guild_id: GuildId, _table: &'static str, _rows_deleted: u64) {}
}
