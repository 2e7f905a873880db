use crate::common::Value;

/// Specifies the direction of one key in a `sort` stage.
///
/// Sort specifications carry `1` for ascending; any other direction value
/// sorts descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Sort in ascending order (smallest to largest, A-Z, oldest to newest)
    Ascending,
    /// Sort in descending order (largest to smallest, Z-A, newest to oldest)
    Descending,
}

impl SortOrder {
    /// Reads a direction from a sort specification value.
    pub fn from_direction(direction: &Value) -> SortOrder {
        match direction.as_number() {
            Some(n) if n == 1.0 => SortOrder::Ascending,
            _ => SortOrder::Descending,
        }
    }

    pub fn direction(&self) -> i64 {
        match self {
            SortOrder::Ascending => 1,
            SortOrder::Descending => -1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_is_ascending() {
        assert_eq!(SortOrder::from_direction(&Value::I64(1)), SortOrder::Ascending);
        assert_eq!(SortOrder::from_direction(&Value::F64(1.0)), SortOrder::Ascending);
    }

    #[test]
    fn anything_else_is_descending() {
        assert_eq!(SortOrder::from_direction(&Value::I64(-1)), SortOrder::Descending);
        assert_eq!(SortOrder::from_direction(&Value::from("asc")), SortOrder::Descending);
        assert_eq!(SortOrder::from_direction(&Value::Null), SortOrder::Descending);
    }

    #[test]
    fn direction_round_trips() {
        assert_eq!(SortOrder::Ascending.direction(), 1);
        assert_eq!(SortOrder::Descending.direction(), -1);
    }
}
