//! # ストア抽象
//!
//! purge 実行機が依存する唯一の外部能力:
//! 「トランザクション内で削除文を実行し、影響行数を返す」。
//!
//! 個別テーブルのアクセサ型には依存しない。実行する文は
//! [`TableDelete`] として記述子のデータから一意に導出される。

use async_trait::async_trait;
use ticketflow_domain::guild::GuildId;

use super::descriptor::{DirectTable, LinkedTable};
use crate::error::InfraError;

/// 1 テーブル分の削除文
///
/// SQL 文字列は [`sql()`](TableDelete::sql) で一意に決まるが、
/// インメモリ実装が構造を解釈できるよう、文字列ではなく
/// 記述子への参照として受け渡す。
#[derive(Debug, Clone, Copy)]
pub enum TableDelete<'a> {
    /// `guild_id` カラムによる直接削除
    Direct(&'a DirectTable),
    /// 親テーブルへのサブクエリ結合による削除
    Linked(&'a LinkedTable),
}

impl TableDelete<'_> {
    /// 削除対象のテーブル名
    pub fn table(&self) -> &'static str {
        match self {
            Self::Direct(spec) => spec.table(),
            Self::Linked(spec) => spec.table(),
        }
    }

    /// 実行する SQL（ギルド ID は `$1` にバインドする）
    pub fn sql(&self) -> String {
        match self {
            Self::Direct(spec) => spec.delete_sql(),
            Self::Linked(spec) => spec.delete_sql(),
        }
    }
}

/// トランザクションを開始できるストア
///
/// 異なるギルドの purge は独立したトランザクションで並行実行してよい。
#[async_trait]
pub trait PurgeStore: Send + Sync {
    /// トランザクションを開始する
    async fn begin(&self) -> Result<Box<dyn PurgeTx>, InfraError>;
}

/// purge 1 回分のトランザクションハンドル
///
/// 実行機が排他的に所有し、purge 間で共有されない。
///
/// # ドロップ時の契約
///
/// `commit` も `rollback` も呼ばれずにドロップされた場合、実装は
/// ロールバックと同等に振る舞わなければならない。これにより、
/// 呼び出し側のキャンセル（future のドロップ）で中断された purge が
/// 部分的にコミットされることはない。
#[async_trait]
pub trait PurgeTx: Send {
    /// 削除文を実行し、削除された行数を返す
    async fn execute(
        &mut self,
        delete: &TableDelete<'_>,
        guild_id: GuildId,
    ) -> Result<u64, InfraError>;

    /// トランザクションをコミットする
    async fn commit(self: Box<Self>) -> Result<(), InfraError>;

    /// トランザクションをロールバックする
    async fn rollback(self: Box<Self>) -> Result<(), InfraError>;
}
