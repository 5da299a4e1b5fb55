//! # GuildPurger
//!
//! 記述子を歩き、単一トランザクション内で全テーブルの削除文を
//! 依存順に実行する実行機。
//!
//! ## 実行順
//!
//! 連結テーブル（記述子順）→ 直接テーブル（記述子順）。
//! すべての文が 1 つのトランザクションを共有するため、テーブル間の
//! 並列化は行わない（トランザクション内の文は直列化される上、
//! 連結→直接の順序不変条件を壊す恐れがある）。
//!
//! ## 失敗時の挙動
//!
//! 最初の文の失敗で残りのテーブルを中断し、ロールバックして
//! 失敗テーブル名付きのエラーを返す。リトライは行わない。削除は
//! 冪等なので、リトライは呼び出し側の判断で purge 全体を再実行する。
//!
//! ## キャンセル
//!
//! [`purge`](GuildPurger::purge) の future をドロップすると実行中の文は
//! 中断され、トランザクションはドロップ時にロールバックされる。
//! キャンセルされた purge が部分的にコミットされることはない。
//! デッドラインは呼び出し側が `tokio::time::timeout` などで課す。

use std::sync::Arc;

use ticketflow_domain::guild::GuildId;

use super::{
    PurgeError,
    PurgeReport,
    TableDeletion,
    descriptor::PurgeDescriptor,
    observer::{PurgeObserver, TracingObserver},
    store::{PurgeStore, PurgeTx, TableDelete},
};
use crate::error::InfraError;

/// ギルドデータの一括削除実行機
///
/// 記述子と観測シンクはプロセス全体で共有可能（読み取り専用）。
/// 異なるギルドの purge を並行して呼び出してよい。各呼び出しは
/// 独立したトランザクションを排他的に所有する。
pub struct GuildPurger {
    store:      Arc<dyn PurgeStore>,
    descriptor: PurgeDescriptor,
    observer:   Arc<dyn PurgeObserver>,
}

impl GuildPurger {
    /// 組み込みの ticket スキーマと tracing 観測で実行機を作成する
    pub fn new(store: Arc<dyn PurgeStore>) -> Self {
        Self {
            store,
            descriptor: PurgeDescriptor::ticket_schema(),
            observer: Arc::new(TracingObserver),
        }
    }

    /// 記述子を差し替える
    pub fn with_descriptor(mut self, descriptor: PurgeDescriptor) -> Self {
        self.descriptor = descriptor;
        self
    }

    /// 観測シンクを差し替える
    pub fn with_observer(mut self, observer: Arc<dyn PurgeObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// 指定ギルドの全データを削除する
    ///
    /// 成功時はテーブル別削除件数を実行順に収めた [`PurgeReport`] を返す。
    /// 失敗時はストアを purge 開始前の状態に戻した上で [`PurgeError`] を
    /// 返す（コミット失敗のみ状態が不定。[`PurgeError::Commit`] を参照）。
    ///
    /// 未知のギルド ID はエラーではなく全テーブル 0 件の成功になる。
    #[tracing::instrument(skip_all, fields(%guild_id))]
    pub async fn purge(&self, guild_id: GuildId) -> Result<PurgeReport, PurgeError> {
        self.observer.on_purge_started(guild_id);

        let mut tx = self.store.begin().await.map_err(PurgeError::Connection)?;

        match self.delete_all(tx.as_mut(), guild_id).await {
            Ok(per_table) => {
                tx.commit().await.map_err(PurgeError::Commit)?;

                let report = PurgeReport {
                    guild_id,
                    per_table,
                };
                self.observer
                    .on_purge_completed(guild_id, report.total_rows_deleted());
                Ok(report)
            }
            Err((table, statement_error)) => {
                tracing::error!(
                    table,
                    %guild_id,
                    error = %statement_error,
                    "テーブルからの削除に失敗"
                );

                match tx.rollback().await {
                    Ok(()) => Err(PurgeError::Statement {
                        table,
                        source: statement_error,
                    }),
                    Err(rollback_error) => Err(PurgeError::Rollback {
                        table,
                        statement_error: Box::new(statement_error),
                        rollback_error:  Box::new(rollback_error),
                    }),
                }
            }
        }
    }

    /// 連結テーブル → 直接テーブルの順で全削除文を実行する
    ///
    /// 最初の失敗で中断し、失敗したテーブル名と元エラーを返す。
    async fn delete_all(
        &self,
        tx: &mut dyn PurgeTx,
        guild_id: GuildId,
    ) -> Result<Vec<TableDeletion>, (&'static str, InfraError)> {
        let mut per_table = Vec::with_capacity(self.descriptor.table_count());

        for spec in self.descriptor.linked_tables() {
            self.delete_one(tx, TableDelete::Linked(spec), guild_id, &mut per_table)
                .await?;
        }
        for spec in self.descriptor.direct_tables() {
            self.delete_one(tx, TableDelete::Direct(spec), guild_id, &mut per_table)
                .await?;
        }

        Ok(per_table)
    }

    async fn delete_one(
        &self,
        tx: &mut dyn PurgeTx,
        delete: TableDelete<'_>,
        guild_id: GuildId,
        per_table: &mut Vec<TableDeletion>,
    ) -> Result<(), (&'static str, InfraError)> {
        let table = delete.table();
        let rows_deleted = tx
            .execute(&delete, guild_id)
            .await
            .map_err(|error| (table, error))?;

        self.observer.on_table_purged(guild_id, table, rows_deleted);
        per_table.push(TableDeletion {
            table,
            rows_deleted,
        });
        Ok(())
    }
}
