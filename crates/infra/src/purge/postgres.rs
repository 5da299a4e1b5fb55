//! # PostgreSQL ストア実装
//!
//! sqlx のトランザクションで [`PurgeStore`] / [`PurgeTx`] を実装する。
//!
//! SQL は記述子から実行時に組み立てられるため、`sqlx::query!` の
//! コンパイル時検証ではなく実行時 API を使用する。テーブル・カラム名は
//! 記述子由来の静的文字列のみで、外部入力が SQL に混入することはない
//! （ギルド ID は常にバインドパラメータ）。

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use ticketflow_domain::guild::GuildId;

use super::store::{PurgeStore, PurgeTx, TableDelete};
use crate::error::InfraError;

/// PostgreSQL の purge ストア
pub struct PgPurgeStore {
    pool: PgPool,
}

impl PgPurgeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PurgeStore for PgPurgeStore {
    async fn begin(&self) -> Result<Box<dyn PurgeTx>, InfraError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgPurgeTx { tx }))
    }
}

/// sqlx トランザクションのラッパー
///
/// コミットせずにドロップされた場合は sqlx が自動的にロールバックする
/// （[`PurgeTx`] のドロップ時契約はこの挙動で満たされる）。
struct PgPurgeTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl PurgeTx for PgPurgeTx {
    async fn execute(
        &mut self,
        delete: &TableDelete<'_>,
        guild_id: GuildId,
    ) -> Result<u64, InfraError> {
        // Snowflake は 2^63 未満のため BIGINT で表現できる
        let result = sqlx::query(&delete.sql())
            .bind(guild_id.value() as i64)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> Result<(), InfraError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), InfraError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
