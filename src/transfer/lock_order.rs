//! Global row-lock order for two-account transfers
//!
//! Locks are always taken on the numerically smaller account number first.
//! Two transfers touching the same pair therefore request locks in the same
//! order whatever their direction, so no cycle of waiters can form.

/// Which side of the request a locked row belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leg {
    From,
    To,
}

/// Lock acquisition plan for one transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockOrder {
    pub first: i64,
    pub second: i64,
    /// Leg of the row locked first
    first_leg: Leg,
}

impl LockOrder {
    pub fn new(from: i64, to: i64) -> Self {
        if from <= to {
            Self {
                first: from,
                second: to,
                first_leg: Leg::From,
            }
        } else {
            Self {
                first: to,
                second: from,
                first_leg: Leg::To,
            }
        }
    }

    /// Numbers in the order their locks must be requested
    pub fn sequence(&self) -> [i64; 2] {
        [self.first, self.second]
    }

    /// Map the two locked rows (in lock order) back to `(from, to)`
    pub fn resolve<T>(&self, first: T, second: T) -> (T, T) {
        match self.first_leg {
            Leg::From => (first, second),
            Leg::To => (second, first),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_is_direction_independent() {
        let forward = LockOrder::new(5, 9);
        let backward = LockOrder::new(9, 5);

        assert_eq!(forward.sequence(), [5, 9]);
        assert_eq!(backward.sequence(), [5, 9]);
    }

    #[test]
    fn test_resolve_restores_request_roles() {
        let forward = LockOrder::new(5, 9);
        assert_eq!(forward.resolve("row5", "row9"), ("row5", "row9"));

        let backward = LockOrder::new(9, 5);
        assert_eq!(backward.resolve("row5", "row9"), ("row9", "row5"));
    }

    #[test]
    fn test_compares_as_integers() {
        // 10 sorts before 9 as a string but not as a number
        assert_eq!(LockOrder::new(10, 9).sequence(), [9, 10]);
        assert_eq!(
            LockOrder::new(1_000_000_000_000, 999_999_999_999).sequence(),
            [999_999_999_999, 1_000_000_000_000]
        );
    }

    #[test]
    fn test_negative_numbers() {
        assert_eq!(LockOrder::new(3, -4).sequence(), [-4, 3]);
    }
}
