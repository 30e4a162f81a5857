use error_types::AuthErrorKind;
use prometheus::IntCounterVec;

lazy_static::lazy_static! {
    pub static ref GATEKEEPER_DECISIONS_TOTAL: IntCounterVec = prometheus::register_int_counter_vec!(
        "gatekeeper_decisions_total",
        "Admission decisions made by the gatekeeper",
        &["outcome", "reason"]
    ).expect("gatekeeper_decisions_total is registered once");
}

pub fn record_admitted() {
    GATEKEEPER_DECISIONS_TOTAL
        .with_label_values(&["admitted", "none"])
        .inc();
}

pub fn record_rejected(kind: AuthErrorKind) {
    GATEKEEPER_DECISIONS_TOTAL
        .with_label_values(&["rejected", kind.as_str()])
        .inc();
}

/// Current count for one label pair
pub fn decision_count(outcome: &str, reason: &str) -> u64 {
    GATEKEEPER_DECISIONS_TOTAL
        .with_label_values(&[outcome, reason])
        .get()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejections_counted_by_reason() {
        let before = decision_count("rejected", "Expired");
        record_rejected(AuthErrorKind::Expired);
        assert!(decision_count("rejected", "Expired") > before);
    }

    #[test]
    fn test_registered_in_default_registry() {
        record_admitted();
        let families = prometheus::gather();
        assert!(families.iter().any(|f| f.get_name() == "gatekeeper_decisions_total"));
    }
}
