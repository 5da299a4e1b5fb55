//! # ギルド
//!
//! TicketFlow が導入される Discord サーバー（ギルド）のモデル。
//!
//! ## マルチギルドとは
//!
//! 単一の Bot インスタンスで多数のサーバーにサービスを提供する構成。
//! 各ギルドのデータは `guild_id` カラムで論理的に分離され、
//! 他のギルドからはアクセスできない。
//!
//! ## 設計判断
//!
//! ### Newtype パターンの採用
//!
//! `GuildId` は `u64` をラップした Newtype である。これにより:
//!
//! - 型安全性: `GuildId` と `UserId` など、同じ整数でも異なる型として扱える
//! - コンパイル時検証: 引数の取り違えをコンパイラが検出
//! - ゼロコスト: 実行時のオーバーヘッドなし
//!
//! ### Snowflake ID の採用
//!
//! ギルド ID は Discord が発番する Snowflake（64bit 符号なし整数）を
//! そのまま使用する。自前の発番は行わない。
//!
//! ## 使用例
//!
//! ```rust
//! use ticketflow_domain::guild::GuildId;
//!
//! // Discord API から受け取った ID を型安全に保持
//! let guild_id = GuildId::new(826720002092630046);
//!
//! // ログ出力
//! println!("ギルド: {}", guild_id);
//! ```

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// ギルド（Discord サーバー）の一意識別子
///
/// すべてのギルド所属データ（チケット、パネル、設定など）は
/// この `GuildId` でスコープされ、ギルド間のデータ分離を保証する。
///
/// # データベース設計
///
/// - ギルド直結テーブルは `guild_id BIGINT` カラムを持つ
/// - 子テーブルは親テーブルへの外部キー経由で間接的にスコープされる
///
/// # 値の範囲
///
/// Snowflake は 64bit 符号なし整数。未知の ID を渡しても
/// エラーにはならない（該当データが 0 件というだけ）ため、
/// 値域のバリデーションは行わない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("{_0}")]
pub struct GuildId(u64);

impl GuildId {
   /// Snowflake からギルド ID を作成する
   ///
   /// Discord API やデータベースから取得した値を
   /// 型安全な `GuildId` に変換する際に使用する。
   ///
   /// # 例
   ///
   /// ```rust
   /// use ticketflow_domain::guild::GuildId;
   ///
   /// let guild_id = GuildId::new(826720002092630046);
   /// assert_eq!(guild_id.value(), 826720002092630046);
   /// ```
   pub fn new(value: u64) -> Self {
      Self(value)
   }

   /// 内部の Snowflake 値を取得する
   ///
   /// データベースへのバインドや、外部 API との連携時に使用する。
   pub fn value(&self) -> u64 {
      self.0
   }
}

impl From<u64> for GuildId {
   fn from(value: u64) -> Self {
      Self(value)
   }
}
