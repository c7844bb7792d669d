//! RoomId 値オブジェクト

use std::{fmt, str::FromStr};

use serde::Serialize;

use super::error::RoomIdError;

/// ルームの識別子（整数）
///
/// クライアントは `/ws?r=<id>` で接続先のルームを指定します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RoomId(i64);

impl RoomId {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl FromStr for RoomId {
    type Err = RoomIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(RoomIdError::Missing);
        }
        s.parse::<i64>()
            .map(Self)
            .map_err(|_| RoomIdError::NotAnInteger(s.to_string()))
    }
}

impl TryFrom<Option<&str>> for RoomId {
    type Error = RoomIdError;

    fn try_from(value: Option<&str>) -> Result<Self, Self::Error> {
        value.ok_or(RoomIdError::Missing)?.parse()
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
