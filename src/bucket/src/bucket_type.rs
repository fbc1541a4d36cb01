/// The calendar/size policy a bucket is persisted under, fixed at
/// construction. `ResultSet` is never persisted - it tags the purely
/// in-memory concatenation built by the query layer.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum BucketType {
    Dynamic,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    ResultSet,
}

/// Which threshold `Bucket::split_needed` checks against.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SplitLimit {
    Soft,
    Hard,
}

impl BucketType {
    pub fn wire_tag(self) -> u16 {
        match self {
            BucketType::Dynamic => 1,
            BucketType::Hourly => 2,
            BucketType::Daily => 3,
            BucketType::Weekly => 4,
            BucketType::Monthly => 5,
            BucketType::ResultSet => 6,
        }
    }

    pub fn from_wire_tag(tag: u16) -> Option<Self> {
        match tag {
            1 => Some(BucketType::Dynamic),
            2 => Some(BucketType::Hourly),
            3 => Some(BucketType::Daily),
            4 => Some(BucketType::Weekly),
            5 => Some(BucketType::Monthly),
            6 => Some(BucketType::ResultSet),
            _ => None,
        }
    }

    pub fn is_calendar(self) -> bool {
        matches!(
            self,
            BucketType::Hourly | BucketType::Daily | BucketType::Weekly | BucketType::Monthly
        )
    }

    /// Greatest calendar window-start `<= ts`. Panics for `Dynamic`/`ResultSet`,
    /// which have no fixed calendar window.
    pub fn left(self, ts: u32) -> u32 {
        match self {
            BucketType::Hourly => calendar::hourly_left(ts),
            BucketType::Daily => calendar::daily_left(ts),
            BucketType::Weekly => calendar::weekly_left(ts),
            BucketType::Monthly => calendar::monthly_left(ts),
            BucketType::Dynamic | BucketType::ResultSet => {
                panic!("{:?} has no calendar window", self)
            }
        }
    }

    /// Inclusive right edge of the calendar window containing `ts`.
    pub fn right(self, ts: u32) -> u32 {
        match self {
            BucketType::Hourly => calendar::hourly_right(ts),
            BucketType::Daily => calendar::daily_right(ts),
            BucketType::Weekly => calendar::weekly_right(ts),
            BucketType::Monthly => calendar::monthly_right(ts),
            BucketType::Dynamic | BucketType::ResultSet => {
                panic!("{:?} has no calendar window", self)
            }
        }
    }
}
