//! # 依存グラフ記述子
//!
//! どのテーブルがギルドのデータを保持するかを宣言する静的な設定表。
//!
//! ## 2 種類のスコープ
//!
//! - **直接テーブル** ([`DirectTable`]): `guild_id` カラムを自身で持つ
//! - **連結テーブル** ([`LinkedTable`]): 親テーブルへの外部キー経由で
//!   間接的にギルドにスコープされる
//!
//! ## 順序の不変条件
//!
//! 連結テーブルの削除はすべて直接テーブルの削除より先に実行される。
//! これにより、サブクエリ結合が参照する親行が削除済みになることはない。
//! この不変条件が破れると、連結テーブルの DELETE は親行が見つからず
//! 0 件に終わる（エラーにならず静かにデータが残る）。
//!
//! 連結テーブルの親がさらに連結テーブルである場合は、連結リスト内で
//! 子が親より先に並んでいなければならない。これは [`PurgeDescriptor::new`]
//! が構築時に検証する。
//!
//! ## 設定であってエンティティではない
//!
//! 記述子はプロセス全体で共有される読み取り専用の設定で、起動時
//! （またはコンパイル時）に一度だけ構築される。構築の失敗は設定ミスで
//! あり、実行時条件ではない。ロックなしの並行読み取りは安全。

use std::collections::HashSet;

use thiserror::Error;

/// `guild_id` カラムを直接持つテーブルの宣言
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectTable {
    table:        &'static str,
    guild_column: &'static str,
}

impl DirectTable {
    pub const fn new(table: &'static str, guild_column: &'static str) -> Self {
        Self {
            table,
            guild_column,
        }
    }

    /// テーブル名
    pub fn table(&self) -> &'static str {
        self.table
    }

    /// ギルド ID を保持するカラム名
    pub fn guild_column(&self) -> &'static str {
        self.guild_column
    }

    /// このテーブルに対する削除文を生成する
    pub fn delete_sql(&self) -> String {
        format!("DELETE FROM {} WHERE {} = $1", self.table, self.guild_column)
    }
}

/// 親テーブルへの外部キー経由でスコープされるテーブルの宣言
///
/// `link_column` の値が、`parent_table` の `parent_key_column` のうち
/// `parent_guild_column = ギルドID` を満たす行のものに一致する行が
/// 削除対象となる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedTable {
    table:               &'static str,
    link_column:         &'static str,
    parent_table:        &'static str,
    parent_key_column:   &'static str,
    parent_guild_column: &'static str,
}

impl LinkedTable {
    pub const fn new(
        table: &'static str,
        link_column: &'static str,
        parent_table: &'static str,
        parent_key_column: &'static str,
        parent_guild_column: &'static str,
    ) -> Self {
        Self {
            table,
            link_column,
            parent_table,
            parent_key_column,
            parent_guild_column,
        }
    }

    /// テーブル名
    pub fn table(&self) -> &'static str {
        self.table
    }

    /// 親テーブルを参照するカラム名
    pub fn link_column(&self) -> &'static str {
        self.link_column
    }

    /// 親テーブル名
    pub fn parent_table(&self) -> &'static str {
        self.parent_table
    }

    /// 親テーブル側の参照先キーカラム名
    pub fn parent_key_column(&self) -> &'static str {
        self.parent_key_column
    }

    /// 親テーブル側のギルド ID カラム名
    pub fn parent_guild_column(&self) -> &'static str {
        self.parent_guild_column
    }

    /// このテーブルに対する削除文（親テーブルへのサブクエリ結合）を生成する
    pub fn delete_sql(&self) -> String {
        format!(
            "DELETE FROM {} WHERE {} IN (SELECT {} FROM {} WHERE {} = $1)",
            self.table,
            self.link_column,
            self.parent_key_column,
            self.parent_table,
            self.parent_guild_column,
        )
    }
}

/// 記述子の構築時検証エラー
///
/// いずれも設定ミスであり、起動時に致命的エラーとして扱う。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DescriptorError {
    /// 同じテーブルが複数回宣言されている
    #[error("テーブル {table} が重複して宣言されています")]
    DuplicateTable {
        table: &'static str,
    },

    /// 連結テーブルの親が直接・連結のどちらにも宣言されていない
    #[error("連結テーブル {table} の親 {parent} が記述子に存在しません")]
    UnknownParent {
        table:  &'static str,
        parent: &'static str,
    },

    /// 連結テーブルの親（自身も連結）が子より先に削除される順序になっている
    ///
    /// この順序では子の削除時に親行が既に消えており、サブクエリが
    /// 0 件に終わる。
    #[error("連結テーブル {table} は親 {parent} より先に並べる必要があります")]
    ParentDeletedFirst {
        table:  &'static str,
        parent: &'static str,
    },
}

/// 依存グラフ記述子
///
/// 削除順に並んだ連結テーブルの列と、それに続く直接テーブルの列。
/// [`PurgeDescriptor::new`] が順序の不変条件を検証するため、構築済みの
/// 記述子は常に安全な削除順を表す。
#[derive(Debug, Clone)]
pub struct PurgeDescriptor {
    linked: Vec<LinkedTable>,
    direct: Vec<DirectTable>,
}

impl PurgeDescriptor {
    /// 記述子を構築し、依存関係を検証する
    ///
    /// # 検証内容
    ///
    /// 1. テーブル名が連結・直接を通して一意であること
    /// 2. すべての連結テーブルの親が記述子内に宣言されていること
    /// 3. 親が連結テーブルの場合、子が親より先に並んでいること
    pub fn new(
        linked: Vec<LinkedTable>,
        direct: Vec<DirectTable>,
    ) -> Result<Self, DescriptorError> {
        let mut seen = HashSet::new();
        for table in linked
            .iter()
            .map(LinkedTable::table)
            .chain(direct.iter().map(DirectTable::table))
        {
            if !seen.insert(table) {
                return Err(DescriptorError::DuplicateTable { table });
            }
        }

        let direct_names: HashSet<&str> = direct.iter().map(DirectTable::table).collect();

        for (index, spec) in linked.iter().enumerate() {
            let parent = spec.parent_table();

            if direct_names.contains(parent) {
                continue;
            }

            match linked.iter().position(|l| l.table() == parent) {
                // 親行より先に子行を消す必要がある
                Some(parent_index) if parent_index <= index => {
                    return Err(DescriptorError::ParentDeletedFirst {
                        table: spec.table(),
                        parent,
                    });
                }
                Some(_) => {}
                None => {
                    return Err(DescriptorError::UnknownParent {
                        table: spec.table(),
                        parent,
                    });
                }
            }
        }

        Ok(Self { linked, direct })
    }

    /// 連結テーブルの列（削除順）
    pub fn linked_tables(&self) -> &[LinkedTable] {
        &self.linked
    }

    /// 直接テーブルの列（削除順）
    pub fn direct_tables(&self) -> &[DirectTable] {
        &self.direct
    }

    /// 宣言されているテーブルの総数
    pub fn table_count(&self) -> usize {
        self.linked.len() + self.direct.len()
    }

    /// TicketFlow 本番スキーマの組み込み記述子
    ///
    /// パネル・サポートチーム・埋め込み・フォームの各サブツリー
    /// （連結 14 テーブル）に続き、`guild_id` 直結の 53 テーブルを宣言する。
    ///
    /// # パニック
    ///
    /// 組み込み定義が検証を通らない場合のみパニックする。これは
    /// プログラミングエラーであり、`purge_schema_test` が構築可能性を
    /// 検証している。
    pub fn ticket_schema() -> Self {
        let l = LinkedTable::new;

        // 引数順: (テーブル, 参照カラム, 親テーブル, 親キー, 親ギルドカラム)
        // 親が連結テーブルの場合（form_input）は子を先に並べる
        let linked = vec![
            l("form_input_api_headers", "input_id", "form_input", "id", "guild_id"),
            l("form_input_api_config", "input_id", "form_input", "id", "guild_id"),
            l("form_input_options", "input_id", "form_input", "id", "guild_id"),
            l("form_input", "form_id", "forms", "form_id", "guild_id"),
            l("multi_panel_targets", "multi_panel_id", "multi_panels", "id", "guild_id"),
            l("panel_access_control_rules", "panel_id", "panels", "panel_id", "guild_id"),
            l("panel_here_mention", "panel_id", "panels", "panel_id", "guild_id"),
            l("panel_role_mentions", "panel_id", "panels", "panel_id", "guild_id"),
            l("panel_support_hours", "panel_id", "panels", "panel_id", "guild_id"),
            l("panel_teams", "panel_id", "panels", "panel_id", "guild_id"),
            l("panel_user_mention", "panel_id", "panels", "panel_id", "guild_id"),
            l("support_team_members", "team_id", "support_team", "id", "guild_id"),
            l("support_team_roles", "team_id", "support_team", "id", "guild_id"),
            l("embed_fields", "embed_id", "embeds", "id", "guild_id"),
        ];

        let d = |table| DirectTable::new(table, "guild_id");

        let direct = vec![
            // チケット関連の子テーブル（tickets より先に削除する）
            d("archive_messages"),
            d("auto_close_exclude"),
            d("category_update_queue"),
            d("close_reason"),
            d("close_request"),
            d("exit_survey_responses"),
            d("first_response_time"),
            d("participants"),
            d("service_ratings"),
            d("ticket_claims"),
            d("ticket_last_message"),
            d("ticket_members"),
            // tickets 本体とカウンター
            d("tickets"),
            d("guild_ticket_counters"),
            // パネル
            d("panels"),
            d("multi_panels"),
            // サポートチーム
            d("support_team"),
            // フォーム
            d("forms"),
            // 埋め込み
            d("embeds"),
            // カスタムインテグレーション
            d("custom_integration_secret_values"),
            d("custom_integration_guilds"),
            // その他のギルド固有テーブル
            d("active_language"),
            d("archive_channel"),
            d("auto_close"),
            d("blacklist"),
            d("channel_category"),
            d("claim_settings"),
            d("close_confirmation"),
            d("custom_colours"),
            d("feedback_enabled"),
            d("guild_leave_time"),
            d("guild_metadata"),
            d("import_logs"),
            d("import_mapping"),
            d("legacy_premium_entitlement_guilds"),
            d("naming_scheme"),
            d("on_call"),
            d("permissions"),
            d("premium_guilds"),
            d("role_blacklist"),
            d("role_permissions"),
            d("server_blacklist"),
            d("settings"),
            d("staff_override"),
            d("tag"),
            d("ticket_limit"),
            d("ticket_permissions"),
            d("used_keys"),
            d("user_can_close"),
            d("user_guilds"),
            d("webhooks"),
            d("welcome_messages"),
            d("whitelabel_guilds"),
        ];

        Self::new(linked, direct).expect("組み込み ticket スキーマの記述子が不正")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn tickets() -> DirectTable {
        DirectTable::new("tickets", "guild_id")
    }

    fn ticket_members() -> LinkedTable {
        LinkedTable::new("ticket_members", "ticket_id", "tickets", "id", "guild_id")
    }

    #[test]
    fn test_有効な記述子を構築できる() {
        let descriptor = PurgeDescriptor::new(vec![ticket_members()], vec![tickets()]).unwrap();

        assert_eq!(descriptor.linked_tables().len(), 1);
        assert_eq!(descriptor.direct_tables().len(), 1);
        assert_eq!(descriptor.table_count(), 2);
    }

    #[rstest]
    #[case::直接同士(vec![], vec![tickets(), tickets()], "tickets")]
    #[case::連結と直接(
        vec![LinkedTable::new("tickets", "panel_id", "panels", "panel_id", "guild_id")],
        vec![tickets(), DirectTable::new("panels", "guild_id")],
        "tickets"
    )]
    fn test_重複テーブルを拒否する(
        #[case] linked: Vec<LinkedTable>,
        #[case] direct: Vec<DirectTable>,
        #[case] duplicate: &'static str,
    ) {
        let err = PurgeDescriptor::new(linked, direct).unwrap_err();
        assert_eq!(err, DescriptorError::DuplicateTable { table: duplicate });
    }

    #[test]
    fn test_未知の親テーブルを拒否する() {
        let err = PurgeDescriptor::new(vec![ticket_members()], vec![]).unwrap_err();

        assert_eq!(
            err,
            DescriptorError::UnknownParent {
                table:  "ticket_members",
                parent: "tickets",
            }
        );
    }

    #[test]
    fn test_親が子より先に削除される順序を拒否する() {
        // form_input（親）が form_input_options（子）より先に並んでいる
        let linked = vec![
            LinkedTable::new("form_input", "form_id", "forms", "form_id", "guild_id"),
            LinkedTable::new("form_input_options", "input_id", "form_input", "id", "guild_id"),
        ];
        let direct = vec![DirectTable::new("forms", "guild_id")];

        let err = PurgeDescriptor::new(linked, direct).unwrap_err();

        assert_eq!(
            err,
            DescriptorError::ParentDeletedFirst {
                table:  "form_input_options",
                parent: "form_input",
            }
        );
    }

    #[test]
    fn test_子が親より先に並んだ連結チェーンは受理される() {
        let linked = vec![
            LinkedTable::new("form_input_options", "input_id", "form_input", "id", "guild_id"),
            LinkedTable::new("form_input", "form_id", "forms", "form_id", "guild_id"),
        ];
        let direct = vec![DirectTable::new("forms", "guild_id")];

        assert!(PurgeDescriptor::new(linked, direct).is_ok());
    }

    #[test]
    fn test_直接テーブルのdelete_sql() {
        assert_eq!(
            tickets().delete_sql(),
            "DELETE FROM tickets WHERE guild_id = $1"
        );
    }

    #[test]
    fn test_連結テーブルのdelete_sql() {
        assert_eq!(
            ticket_members().delete_sql(),
            "DELETE FROM ticket_members WHERE ticket_id IN \
             (SELECT id FROM tickets WHERE guild_id = $1)"
        );
    }

    #[test]
    fn test_組み込みスキーマは検証を通過する() {
        let descriptor = PurgeDescriptor::ticket_schema();

        assert_eq!(descriptor.linked_tables().len(), 14);
        assert_eq!(descriptor.direct_tables().len(), 53);
    }
}
