use crate::models::{OrderError, OrderStatus};

/// Statuses reachable from `from` in a single admin action.
///
/// `delivered` is a sub-state en route to `completed`; `completed` also
/// remains directly reachable from `approved` for same-day settlement.
pub fn allowed_transitions(from: OrderStatus) -> &'static [OrderStatus] {
    use OrderStatus::*;
    match from {
        Pending => &[Approved, Rejected],
        Approved => &[Delivered, Completed, NotDelivered],
        Delivered => &[Completed],
        Completed | Rejected | NotDelivered => &[],
    }
}

impl OrderStatus {
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        allowed_transitions(self).contains(&next)
    }

    /// Terminal statuses admit no further transition; deletion is the only
    /// repository operation still permitted.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Completed | OrderStatus::Rejected | OrderStatus::NotDelivered
        )
    }
}

pub fn check_transition(from: OrderStatus, to: OrderStatus) -> Result<(), OrderError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(OrderError::InvalidTransition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    const ALL: [OrderStatus; 6] = [Pending, Approved, Rejected, Delivered, Completed, NotDelivered];

    #[test]
    fn pending_only_reaches_approved_or_rejected() {
        for next in ALL {
            let allowed = matches!(next, Approved | Rejected);
            assert_eq!(Pending.can_transition_to(next), allowed, "pending -> {next:?}");
        }
    }

    #[test]
    fn approved_reaches_the_three_delivery_outcomes() {
        for next in ALL {
            let allowed = matches!(next, Delivered | Completed | NotDelivered);
            assert_eq!(Approved.can_transition_to(next), allowed, "approved -> {next:?}");
        }
    }

    #[test]
    fn delivered_only_completes() {
        for next in ALL {
            assert_eq!(Delivered.can_transition_to(next), next == Completed, "delivered -> {next:?}");
        }
    }

    #[test]
    fn terminal_statuses_admit_nothing() {
        for from in [Completed, Rejected, NotDelivered] {
            assert!(from.is_terminal());
            for next in ALL {
                assert!(!from.can_transition_to(next), "{from:?} -> {next:?}");
            }
        }
        assert!(!Pending.is_terminal());
        assert!(!Approved.is_terminal());
        assert!(!Delivered.is_terminal());
    }

    #[test]
    fn check_transition_reports_the_offending_edge() {
        let err = check_transition(Pending, Completed).unwrap_err();
        assert!(matches!(
            err,
            OrderError::InvalidTransition { from: Pending, to: Completed }
        ));
    }
}
