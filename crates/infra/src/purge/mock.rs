//! # テスト用モックストア
//!
//! purge のユニットテストで使用するインメモリストア。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! ticketflow-infra = { workspace = true, features = ["test-utils"] }
//! ```
//!
//! ## トランザクションの模倣
//!
//! `begin` で全テーブルのスナップショットを取り、削除はスナップショット
//! にのみ適用する。`commit` でスナップショットを公開し、`rollback`
//! またはドロップで破棄する。これにより原子性のテスト（N 番目の文で
//! 失敗させて元の状態が残ることの検証）が実データベースなしで行える。
//!
//! ## 結合の解決
//!
//! 連結テーブルの削除は、トランザクション内の「現在の」親テーブル状態に
//! 対して解決される。親行が既に削除されていればサブクエリは 0 件になる。
//! 削除順の不変条件はモック上でも実際に検証可能。

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use ticketflow_domain::guild::GuildId;

use super::store::{PurgeStore, PurgeTx, TableDelete};
use crate::error::InfraError;

/// モックストア上の 1 行
///
/// 実テーブルのカラムのうち purge が参照するものだけをモデル化する。
#[derive(Debug, Clone)]
struct MockRow {
    /// 主キー相当。連結テーブルの親キー参照の解決に使用する
    key:        u64,
    /// `guild_id` カラムの値（直接テーブルの行のみ）
    guild_id:   Option<u64>,
    /// 親テーブルの key への参照（連結テーブルの行のみ）
    link_value: Option<u64>,
}

type Tables = HashMap<&'static str, Vec<MockRow>>;

#[derive(Default)]
struct MockState {
    tables:        Tables,
    fail_begin:    bool,
    fail_tables:   HashSet<&'static str>,
    fail_commit:   bool,
    fail_rollback: bool,
    /// 発行された削除文のテーブル名（発行順。失敗した文も含む）
    executed:      Vec<&'static str>,
}

/// インメモリの purge ストア
#[derive(Clone, Default)]
pub struct MockPurgeStore {
    state: Arc<Mutex<MockState>>,
}

impl MockPurgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 直接テーブルに 1 行追加する
    pub fn insert_direct(&self, table: &'static str, key: u64, guild_id: u64) {
        self.insert_row(table, key, Some(guild_id), None);
    }

    /// 連結テーブルに 1 行追加する（`link_value` は親の key を指す）
    pub fn insert_linked(&self, table: &'static str, key: u64, link_value: u64) {
        self.insert_row(table, key, None, link_value.into());
    }

    /// 任意のカラム構成で 1 行追加する
    ///
    /// `guild_id` と `link_value` の両方を持つ行（連結チェーンの中間
    /// テーブルなど）を作る場合に使用する。
    pub fn insert_row(
        &self,
        table: &'static str,
        key: u64,
        guild_id: Option<u64>,
        link_value: Option<u64>,
    ) {
        self.state
            .lock()
            .unwrap()
            .tables
            .entry(table)
            .or_default()
            .push(MockRow {
                key,
                guild_id,
                link_value,
            });
    }

    /// テーブルの総行数（コミット済みの状態）
    pub fn count(&self, table: &'static str) -> usize {
        self.state
            .lock()
            .unwrap()
            .tables
            .get(table)
            .map_or(0, Vec::len)
    }

    /// 指定ギルドに属する直接テーブルの行数（コミット済みの状態）
    pub fn count_for_guild(&self, table: &'static str, guild_id: GuildId) -> usize {
        self.state
            .lock()
            .unwrap()
            .tables
            .get(table)
            .map_or(0, |rows| {
                rows.iter()
                    .filter(|row| row.guild_id == Some(guild_id.value()))
                    .count()
            })
    }

    /// 発行された削除文のテーブル名を発行順に返す
    pub fn executed_tables(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().executed.clone()
    }

    /// トランザクション開始を失敗させる
    pub fn fail_on_begin(&self) {
        self.state.lock().unwrap().fail_begin = true;
    }

    /// 指定テーブルへの削除文を失敗させる
    pub fn fail_on_table(&self, table: &'static str) {
        self.state.lock().unwrap().fail_tables.insert(table);
    }

    /// コミットを失敗させる
    pub fn fail_on_commit(&self) {
        self.state.lock().unwrap().fail_commit = true;
    }

    /// ロールバックを失敗させる
    pub fn fail_on_rollback(&self) {
        self.state.lock().unwrap().fail_rollback = true;
    }
}

#[async_trait]
impl PurgeStore for MockPurgeStore {
    async fn begin(&self) -> Result<Box<dyn PurgeTx>, InfraError> {
        let state = self.state.lock().unwrap();
        if state.fail_begin {
            return Err(InfraError::unexpected(
                "トランザクション開始を拒否（注入された失敗）",
            ));
        }

        Ok(Box::new(MockTx {
            pending: state.tables.clone(),
            state:   Arc::clone(&self.state),
        }))
    }
}

/// スナップショットに対して削除を適用するトランザクション
///
/// `commit` されずにドロップされた場合、スナップショットは破棄される
/// （= ロールバック）。
struct MockTx {
    pending: Tables,
    state:   Arc<Mutex<MockState>>,
}

#[async_trait]
impl PurgeTx for MockTx {
    async fn execute(
        &mut self,
        delete: &TableDelete<'_>,
        guild_id: GuildId,
    ) -> Result<u64, InfraError> {
        let table = delete.table();

        {
            let mut state = self.state.lock().unwrap();
            state.executed.push(table);
            if state.fail_tables.contains(table) {
                return Err(InfraError::unexpected(format!(
                    "{table} の削除を拒否（注入された失敗）"
                )));
            }
        }

        let deleted = match delete {
            TableDelete::Direct(_) => {
                let rows = self.pending.entry(table).or_default();
                let before = rows.len();
                rows.retain(|row| row.guild_id != Some(guild_id.value()));
                before - rows.len()
            }
            TableDelete::Linked(spec) => {
                // トランザクション内の現在の親状態に対して結合を解決する
                let parent_keys: HashSet<u64> = self
                    .pending
                    .get(spec.parent_table())
                    .map(|rows| {
                        rows.iter()
                            .filter(|row| row.guild_id == Some(guild_id.value()))
                            .map(|row| row.key)
                            .collect()
                    })
                    .unwrap_or_default();

                let rows = self.pending.entry(table).or_default();
                let before = rows.len();
                rows.retain(|row| row.link_value.is_none_or(|v| !parent_keys.contains(&v)));
                before - rows.len()
            }
        };

        Ok(deleted as u64)
    }

    async fn commit(self: Box<Self>) -> Result<(), InfraError> {
        let MockTx { pending, state } = *self;

        let mut state = state.lock().unwrap();
        if state.fail_commit {
            return Err(InfraError::unexpected("コミットを拒否（注入された失敗）"));
        }

        state.tables = pending;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), InfraError> {
        let state = self.state.lock().unwrap();
        if state.fail_rollback {
            return Err(InfraError::unexpected(
                "ロールバックを拒否（注入された失敗）",
            ));
        }

        // スナップショット（self.pending）はドロップで破棄される
        Ok(())
    }
}
