use crate::entities::consignment::ConsignmentStatus;
use crate::errors::ServiceError;

/// Statuses a consignment may move to from the given status.
///
/// The table is fixed: Booked -> Loaded -> In Transit -> Delivered -> Settled,
/// with Cancelled reachable from any pre-delivery status. Settled and
/// Cancelled are terminal.
pub fn allowed_transitions(from: ConsignmentStatus) -> &'static [ConsignmentStatus] {
    use ConsignmentStatus::*;
    match from {
        Booked => &[Loaded, Cancelled],
        Loaded => &[InTransit, Cancelled],
        InTransit => &[Delivered, Cancelled],
        Delivered => &[Settled],
        Settled => &[],
        Cancelled => &[],
    }
}

/// Checks a transition, where `from == None` means the consignment is being
/// created. Booked is the only legal initial status.
pub fn is_valid_transition(from: Option<ConsignmentStatus>, to: ConsignmentStatus) -> bool {
    match from {
        None => to == ConsignmentStatus::Booked,
        Some(current) => allowed_transitions(current).contains(&to),
    }
}

/// Validates a transition between two existing statuses, returning the
/// Conflict-class error the HTTP layer maps to 409.
pub fn validate_transition(
    from: ConsignmentStatus,
    to: ConsignmentStatus,
) -> Result<(), ServiceError> {
    if is_valid_transition(Some(from), to) {
        Ok(())
    } else {
        Err(ServiceError::InvalidStatusTransition(format!(
            "cannot transition consignment from '{}' to '{}'",
            from, to
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Iterable;
    use test_case::test_case;
    use ConsignmentStatus::*;

    #[test_case(Booked, Loaded)]
    #[test_case(Booked, Cancelled)]
    #[test_case(Loaded, InTransit)]
    #[test_case(Loaded, Cancelled)]
    #[test_case(InTransit, Delivered)]
    #[test_case(InTransit, Cancelled)]
    #[test_case(Delivered, Settled)]
    fn legal_transitions_pass(from: ConsignmentStatus, to: ConsignmentStatus) {
        assert!(is_valid_transition(Some(from), to));
        assert!(validate_transition(from, to).is_ok());
    }

    #[test_case(Booked, Delivered)]
    #[test_case(Booked, InTransit)]
    #[test_case(Booked, Settled)]
    #[test_case(Loaded, Delivered)]
    #[test_case(Delivered, Cancelled)]
    #[test_case(Delivered, Booked)]
    #[test_case(Settled, Booked)]
    #[test_case(Settled, Cancelled)]
    #[test_case(Cancelled, Booked)]
    #[test_case(Cancelled, Delivered)]
    fn illegal_transitions_fail(from: ConsignmentStatus, to: ConsignmentStatus) {
        assert!(!is_valid_transition(Some(from), to));
        assert!(matches!(
            validate_transition(from, to),
            Err(ServiceError::InvalidStatusTransition(_))
        ));
    }

    #[test]
    fn creation_edge_only_allows_booked() {
        for to in ConsignmentStatus::iter() {
            assert_eq!(is_valid_transition(None, to), to == Booked);
        }
    }

    #[test]
    fn terminal_statuses_have_no_exits() {
        assert!(allowed_transitions(Settled).is_empty());
        assert!(allowed_transitions(Cancelled).is_empty());
    }

    #[test]
    fn every_pair_matches_the_table() {
        for from in ConsignmentStatus::iter() {
            for to in ConsignmentStatus::iter() {
                let expected = allowed_transitions(from).contains(&to);
                assert_eq!(is_valid_transition(Some(from), to), expected);
            }
        }
    }

    #[test]
    fn same_status_is_never_a_transition() {
        for status in ConsignmentStatus::iter() {
            assert!(!is_valid_transition(Some(status), status));
        }
    }
}
