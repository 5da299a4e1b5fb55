//! 組み込み ticket スキーマ記述子の検証テスト
//!
//! `PurgeDescriptor::ticket_schema` が宣言するテーブル集合と削除順の
//! 構造的な整合性を検証する。テーブルの宣言漏れ・削除順の退行を
//! 検出するためのテストで、DB 接続は不要。
//!
//! 実行方法:
//! ```bash
//! cargo test -p ticketflow-infra --test purge_schema_test
//! ```

use std::collections::HashSet;

use ticketflow_infra::purge::{DirectTable, LinkedTable, PurgeDescriptor};

#[test]
fn test_組み込みスキーマは構築できる() {
   // ticket_schema は内部で検証済みの記述子を返す（不正ならパニック）
   let descriptor = PurgeDescriptor::ticket_schema();

   assert_eq!(descriptor.linked_tables().len(), 14);
   assert_eq!(descriptor.direct_tables().len(), 53);
   assert_eq!(descriptor.table_count(), 67);
}

#[test]
fn test_テーブル名に重複がない() {
   let descriptor = PurgeDescriptor::ticket_schema();

   let names: Vec<&str> = descriptor
      .linked_tables()
      .iter()
      .map(LinkedTable::table)
      .chain(descriptor.direct_tables().iter().map(DirectTable::table))
      .collect();

   let unique: HashSet<&&str> = names.iter().collect();
   assert_eq!(
      names.len(),
      unique.len(),
      "テーブル名に重複があります: {names:?}"
   );
}

#[test]
fn test_連結テーブルの親はすべて宣言されている() {
   let descriptor = PurgeDescriptor::ticket_schema();

   let declared: HashSet<&str> = descriptor
      .linked_tables()
      .iter()
      .map(LinkedTable::table)
      .chain(descriptor.direct_tables().iter().map(DirectTable::table))
      .collect();

   for linked in descriptor.linked_tables() {
      assert!(
         declared.contains(linked.parent_table()),
         "連結テーブル {} の親 {} が宣言されていません",
         linked.table(),
         linked.parent_table(),
      );
   }
}

#[test]
fn test_主要テーブルがカバーされている() {
   let descriptor = PurgeDescriptor::ticket_schema();

   let direct: HashSet<&str> = descriptor
      .direct_tables()
      .iter()
      .map(DirectTable::table)
      .collect();
   let linked: HashSet<&str> = descriptor
      .linked_tables()
      .iter()
      .map(LinkedTable::table)
      .collect();

   // 直接テーブル側の主要テーブル
   for table in [
      "tickets",
      "ticket_members",
      "guild_ticket_counters",
      "panels",
      "multi_panels",
      "support_team",
      "forms",
      "embeds",
      "settings",
      "webhooks",
   ] {
      assert!(direct.contains(table), "{table} が直接テーブルにありません");
   }

   // 連結テーブル側の主要テーブル
   for table in [
      "panel_here_mention",
      "multi_panel_targets",
      "support_team_members",
      "embed_fields",
      "form_input",
      "form_input_options",
   ] {
      assert!(linked.contains(table), "{table} が連結テーブルにありません");
   }
}

#[test]
fn test_form_inputの子テーブルはform_inputより先に並ぶ() {
   let descriptor = PurgeDescriptor::ticket_schema();

   let position = |table: &str| {
      descriptor
         .linked_tables()
         .iter()
         .position(|l| l.table() == table)
         .unwrap_or_else(|| panic!("{table} が連結テーブルにありません"))
   };

   let parent = position("form_input");
   for child in [
      "form_input_api_headers",
      "form_input_api_config",
      "form_input_options",
   ] {
      assert!(
         position(child) < parent,
         "{child} は form_input より先に削除される必要があります",
      );
   }
}
