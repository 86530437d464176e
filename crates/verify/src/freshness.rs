//! # タイムスタンプ鮮度チェック
//!
//! 捕捉済みリクエストの再送（リプレイ）を、申告タイムスタンプの
//! 古さで弾く。純粋関数でI/Oを行わない。

use chrono::{DateTime, Utc};

use crate::VerifyError;

/// 申告タイムスタンプの鮮度を検査する。
///
/// `now - declared` を秒単位で計算し、`tolerance_secs` を超えていれば
/// `TooOld`。境界値ちょうどは受理する。差が負（申告時刻が未来）の
/// 場合は時計ずれとして受理する。拒否するのは古すぎる場合のみ。
pub fn check_freshness(
    declared: DateTime<Utc>,
    now: DateTime<Utc>,
    tolerance_secs: i64,
) -> Result<(), VerifyError> {
    let difference_secs = (now - declared).num_seconds();

    if difference_secs > tolerance_secs {
        return Err(VerifyError::TooOld);
    }

    Ok(())
}
