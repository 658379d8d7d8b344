//! Alert Evaluator: independent predicate → advisory rules over the answers.
//!
//! `evaluate` is a pure function of the Answer Set and is called after every
//! change. Output order is rule declaration order.

use serde::{Deserialize, Serialize};

use crate::questionnaire::answers::AnswerSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    /// Stable rule id; also the key the front end uses to remember dismissals.
    pub rule: &'static str,
    pub severity: Severity,
    pub message: &'static str,
}

struct AlertRule {
    id: &'static str,
    severity: Severity,
    message: &'static str,
    applies: fn(&AnswerSet) -> bool,
}

static RULES: &[AlertRule] = &[
    AlertRule {
        id: "gst_registration",
        severity: Severity::Critical,
        message: "URGENT: You are likely required to register for GST immediately as your \
                  turnover exceeds ₹20 Lakhs.",
        applies: gst_threshold_without_registration,
    },
    AlertRule {
        id: "lut_missing",
        severity: Severity::Critical,
        message: "CRITICAL: Without LUT, you're liable for 18% IGST on all export income. \
                  File Form GST RFD-11 immediately!",
        applies: registered_without_lut,
    },
    AlertRule {
        id: "tax_audit",
        severity: Severity::High,
        message: "Turnover above ₹75 Lakhs crosses the tax audit threshold for professionals \
                  (Section 44AB). Engage a Chartered Accountant before the audit due date.",
        applies: above_audit_threshold,
    },
    AlertRule {
        id: "crypto_receipts",
        severity: Severity::High,
        message: "Crypto receipts are taxed at a flat 30% as virtual digital assets, with 1% TDS \
                  on transfers, and no losses can be set off.",
        applies: receives_crypto,
    },
    AlertRule {
        id: "foreign_tax_forms",
        severity: Severity::Medium,
        message: "Foreign clients may withhold tax on your invoices unless you submit W-8BEN or \
                  treaty residency forms (TRC, Form 10F).",
        applies: foreign_clients_without_forms,
    },
    AlertRule {
        id: "tds_on_payments",
        severity: Severity::Medium,
        message: "Paying anyone more than ₹30,000 a year for professional services may require \
                  you to deduct TDS and file quarterly returns.",
        applies: pays_above_tds_threshold,
    },
    AlertRule {
        id: "weak_expense_records",
        severity: Severity::Medium,
        message: "Weak expense records make regular-books taxation risky. Keep invoices and \
                  receipts, or rely on presumptive taxation.",
        applies: weak_expense_records,
    },
];

fn gst_threshold_without_registration(answers: &AnswerSet) -> bool {
    let above_threshold = matches!(
        answers.token("revenue"),
        Some("20l_to_50l" | "50l_to_75l" | "above_75l")
    );
    above_threshold && answers.token("gst_number") == Some("no")
}

fn registered_without_lut(answers: &AnswerSet) -> bool {
    answers.token("gst_number") == Some("yes") && answers.token("lut_filed") != Some("yes")
}

fn above_audit_threshold(answers: &AnswerSet) -> bool {
    answers.token("revenue") == Some("above_75l")
}

fn receives_crypto(answers: &AnswerSet) -> bool {
    answers.contains_token("payment_methods", "crypto")
}

fn foreign_clients_without_forms(answers: &AnswerSet) -> bool {
    let foreign = answers
        .tokens("client_location")
        .iter()
        .any(|location| location != "india");
    let answered = answers.token("tax_forms");
    foreign && answered.is_some() && answered != Some("signed")
}

fn pays_above_tds_threshold(answers: &AnswerSet) -> bool {
    answers.token("pay_above_30k") == Some("yes")
}

fn weak_expense_records(answers: &AnswerSet) -> bool {
    answers.rating("expense_records").is_some_and(|r| r <= 2)
}

/// Evaluates every rule against `answers`.
pub fn evaluate(answers: &AnswerSet) -> Vec<Alert> {
    RULES
        .iter()
        .filter(|rule| (rule.applies)(answers))
        .map(|rule| Alert {
            rule: rule.id,
            severity: rule.severity,
            message: rule.message,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questionnaire::answers::AnswerValue;
    use crate::testing::complete_answers;

    fn rules(alerts: &[Alert]) -> Vec<&'static str> {
        alerts.iter().map(|a| a.rule).collect()
    }

    #[test]
    fn test_gst_threshold_without_registration() {
        let mut answers = AnswerSet::new();
        answers.select("revenue", "20l_to_50l");
        answers.select("gst_number", "no");

        let alerts = evaluate(&answers);
        let critical_gst: Vec<_> = alerts
            .iter()
            .filter(|a| a.severity == Severity::Critical && a.message.contains("GST"))
            .collect();
        assert_eq!(critical_gst.len(), 1);
        assert!(critical_gst[0].message.contains("register for GST"));
    }

    #[test]
    fn test_lowest_bracket_needs_no_gst() {
        let mut answers = AnswerSet::new();
        answers.select("revenue", "less_than_20l");
        answers.select("gst_number", "no");
        assert!(evaluate(&answers).is_empty());
    }

    #[test]
    fn test_unknown_revenue_bracket_raises_nothing() {
        let mut answers = AnswerSet::new();
        answers.select("revenue", "under_20l");
        answers.select("gst_number", "no");
        assert!(evaluate(&answers).is_empty());
    }

    #[test]
    fn test_unanswered_revenue_raises_nothing() {
        let mut answers = AnswerSet::new();
        answers.select("gst_number", "no");
        assert!(evaluate(&answers).is_empty());
    }

    #[test]
    fn test_lut_missing_when_registered() {
        let mut answers = AnswerSet::new();
        answers.select("gst_number", "yes");
        answers.select("lut_filed", "no_dont_know");
        let alerts = evaluate(&answers);
        assert_eq!(rules(&alerts), vec!["lut_missing"]);
        assert_eq!(alerts[0].severity, Severity::Critical);
        assert!(alerts[0].message.contains("LUT"));

        answers.clear("lut_filed");
        assert_eq!(rules(&evaluate(&answers)), vec!["lut_missing"]);

        answers.select("lut_filed", "yes");
        assert!(evaluate(&answers).is_empty());
    }

    #[test]
    fn test_no_lut_alert_without_gst_regardless_of_stored_lut() {
        for lut in ["yes", "no_dont_know"] {
            let mut answers = AnswerSet::new();
            answers.select("gst_number", "no");
            answers.select("lut_filed", lut);
            assert!(!evaluate(&answers).iter().any(|a| a.message.contains("LUT")));
        }
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let mut answers = complete_answers();
        answers.select("revenue", "above_75l");
        answers.select("gst_number", "no");
        answers.toggle("payment_methods", "crypto");
        assert_eq!(evaluate(&answers), evaluate(&answers));
        assert_eq!(
            rules(&evaluate(&answers)),
            vec!["gst_registration", "tax_audit", "crypto_receipts"]
        );
    }

    #[test]
    fn test_unrelated_field_leaves_alerts_unchanged() {
        let mut answers = AnswerSet::new();
        answers.select("revenue", "50l_to_75l");
        answers.select("gst_number", "no");
        let before = evaluate(&answers);

        answers.select("investments", "regular");
        answers.set("profession", AnswerValue::Text("Designer".into()));
        assert_eq!(evaluate(&answers), before);
    }

    #[test]
    fn test_supplementary_rules() {
        let mut answers = complete_answers();
        answers.select("tax_forms", "ignored");
        answers.select("pay_above_30k", "yes");
        answers.set("expense_records", AnswerValue::Rating(2));
        assert_eq!(
            rules(&evaluate(&answers)),
            vec!["foreign_tax_forms", "tds_on_payments", "weak_expense_records"]
        );
    }

    #[test]
    fn test_domestic_only_clients_need_no_foreign_forms() {
        let mut answers = complete_answers();
        answers.set("client_location", AnswerValue::Tokens(vec!["india".into()]));
        answers.select("tax_forms", "no");
        assert!(evaluate(&answers).is_empty());
    }

    #[test]
    fn test_complete_answers_raise_nothing() {
        assert!(evaluate(&complete_answers()).is_empty());
    }

    #[test]
    fn test_alert_serializes_rule_id() {
        let mut answers = AnswerSet::new();
        answers.select("gst_number", "yes");
        let alert = serde_json::to_value(&evaluate(&answers)[0]).unwrap();
        assert_eq!(alert["rule"], "lut_missing");
        assert_eq!(alert["severity"], "critical");
    }
}
