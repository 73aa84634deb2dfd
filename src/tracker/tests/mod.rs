use super::test_helpers::*;
use super::*;
use crate::types::{COMPLETED, ExtractStatus, StatusCounts, TORRENT};
use chrono::{TimeDelta, Utc};
use std::sync::atomic::Ordering;

const HOUR: Duration = Duration::from_secs(3600);
