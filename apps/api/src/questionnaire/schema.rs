//! The canonical freelancer tax questionnaire.
//!
//! Questions are defined once, statically, in display order. A question with a
//! `visible_if` predicate is only asked when the predicate holds for the answers
//! collected so far.

use std::fmt;

use serde::Serialize;

use crate::questionnaire::answers::AnswerSet;

/// Version of the answer shape below. Bump whenever ids or tokens change so
/// stale drafts are discarded instead of half-restored.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    SingleChoice,
    MultiChoice,
    FreeText,
    LongText,
    Rating,
    FileMarker,
}

impl InputKind {
    pub fn is_choice(self) -> bool {
        matches!(self, InputKind::SingleChoice | InputKind::MultiChoice)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChoiceOption {
    pub value: &'static str,
    pub label: &'static str,
}

pub type VisibilityPredicate = fn(&AnswerSet) -> bool;

/// A static question definition.
#[derive(Clone, Copy)]
pub struct Question {
    pub id: &'static str,
    /// Short name used in the plan prompt and the PDF summary table.
    pub label: &'static str,
    pub prompt: &'static str,
    pub kind: InputKind,
    pub options: &'static [ChoiceOption],
    pub required: bool,
    /// Message shown next to the question when a required answer is missing.
    pub missing_message: &'static str,
    pub help: Option<&'static str>,
    pub visible_if: Option<VisibilityPredicate>,
}

impl Question {
    pub fn is_visible(&self, answers: &AnswerSet) -> bool {
        self.visible_if.map_or(true, |predicate| predicate(answers))
    }

    pub fn allows(&self, token: &str) -> bool {
        self.options.iter().any(|o| o.value == token)
    }

    pub fn label_for(&self, token: &str) -> Option<&'static str> {
        self.options
            .iter()
            .find(|o| o.value == token)
            .map(|o| o.label)
    }
}

impl fmt::Debug for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Question")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("required", &self.required)
            .field("conditional", &self.visible_if.is_some())
            .finish_non_exhaustive()
    }
}

fn gst_registered(answers: &AnswerSet) -> bool {
    answers.token("gst_number") == Some("yes")
}

const YES_NO: &[ChoiceOption] = &[
    ChoiceOption { value: "yes", label: "Yes" },
    ChoiceOption { value: "no", label: "No" },
];

pub static QUESTIONS: &[Question] = &[
    Question {
        id: "revenue",
        label: "Estimated Revenue",
        prompt: "What is your estimated total revenue for this Financial Year (Apr-Mar)?",
        kind: InputKind::SingleChoice,
        options: &[
            ChoiceOption { value: "less_than_20l", label: "Less than ₹20 Lakhs" },
            ChoiceOption { value: "20l_to_50l", label: "₹20 Lakhs to ₹50 Lakhs" },
            ChoiceOption { value: "50l_to_75l", label: "₹50 Lakhs to ₹75 Lakhs" },
            ChoiceOption { value: "above_75l", label: "Above ₹75 Lakhs" },
        ],
        required: true,
        missing_message: "Please select your estimated total revenue.",
        help: Some("Critical for GST (₹20L threshold) and Tax Audit (₹75L for professionals)."),
        visible_if: None,
    },
    Question {
        id: "client_location",
        label: "Client Locations",
        prompt: "Where are your clients located? (Select all that apply)",
        kind: InputKind::MultiChoice,
        options: &[
            ChoiceOption { value: "india", label: "India (Domestic clients)" },
            ChoiceOption { value: "usa", label: "USA" },
            ChoiceOption { value: "uk_europe", label: "UK / Europe" },
            ChoiceOption { value: "uae_middle_east", label: "UAE / Middle East" },
            ChoiceOption { value: "other", label: "Other countries" },
        ],
        required: true,
        missing_message: "Please select at least one client location.",
        help: Some("Determines DTAA forms, mixed income scenarios, and GST complexity."),
        visible_if: None,
    },
    Question {
        id: "payment_methods",
        label: "Payment Methods",
        prompt: "How do you receive payments? (Select all that apply)",
        kind: InputKind::MultiChoice,
        options: &[
            ChoiceOption { value: "paypal_stripe", label: "PayPal / Stripe" },
            ChoiceOption { value: "wise_payoneer", label: "Wise / Payoneer" },
            ChoiceOption { value: "swift", label: "Direct Bank Wire (SWIFT)" },
            ChoiceOption { value: "crypto", label: "Cryptocurrency" },
        ],
        required: true,
        missing_message: "Please select at least one payment method.",
        help: Some("Determines forex documentation requirements and crypto tax implications."),
        visible_if: None,
    },
    Question {
        id: "gst_number",
        label: "GST Registered",
        prompt: "Do you currently have a GST Registration Number?",
        kind: InputKind::SingleChoice,
        options: YES_NO,
        required: true,
        missing_message: "Do you have a GST Number?",
        help: Some("Registration is mandatory once turnover crosses ₹20 Lakhs."),
        visible_if: None,
    },
    Question {
        id: "lut_filed",
        label: "LUT Filed",
        prompt: "Did you file the Letter of Undertaking (LUT) for the current Financial Year?",
        kind: InputKind::SingleChoice,
        options: &[
            ChoiceOption { value: "yes", label: "Yes, LUT is filed (Form GST RFD-11)" },
            ChoiceOption { value: "no_dont_know", label: "No / I don't know what LUT is" },
        ],
        required: true,
        missing_message: "Please indicate if you have filed an LUT.",
        help: Some("LUT allows export of services without paying 18% IGST."),
        visible_if: Some(gst_registered),
    },
    Question {
        id: "tax_forms",
        label: "Client Tax Forms",
        prompt: "Have your foreign clients asked you to sign tax forms such as W-8BEN?",
        kind: InputKind::SingleChoice,
        options: &[
            ChoiceOption { value: "signed", label: "Yes, and I signed them" },
            ChoiceOption { value: "ignored", label: "Yes, but I ignored them" },
            ChoiceOption { value: "no", label: "No, never asked" },
        ],
        required: true,
        missing_message: "Please select an option regarding tax forms.",
        help: Some("Treaty forms prevent foreign withholding on your invoices."),
        visible_if: None,
    },
    Question {
        id: "profession",
        label: "Profession",
        prompt: "What is your main profession?",
        kind: InputKind::FreeText,
        options: &[],
        required: true,
        missing_message: "Please enter your main profession.",
        help: Some("Determines Section 44ADA (50% presumptive profit) vs 44AD (6%/8% profit)."),
        visible_if: None,
    },
    Question {
        id: "capital_expenditure",
        label: "Capital Expenditure",
        prompt: "Did you buy equipment (laptop, camera, software licences) for work this year?",
        kind: InputKind::SingleChoice,
        options: &[
            ChoiceOption { value: "above_50k", label: "Yes, above ₹50,000" },
            ChoiceOption { value: "below_50k", label: "Yes, below ₹50,000" },
            ChoiceOption { value: "no", label: "No" },
        ],
        required: true,
        missing_message: "Please select your capital expenditure status.",
        help: Some("Large purchases may favour regular books over presumptive taxation."),
        visible_if: None,
    },
    Question {
        id: "expense_records",
        label: "Expense Records Quality",
        prompt: "How well do you keep records of your business expenses? (1 = none, 5 = every receipt)",
        kind: InputKind::Rating,
        options: &[],
        required: true,
        missing_message: "Please rate your expense records quality.",
        help: None,
        visible_if: None,
    },
    Question {
        id: "investments",
        label: "Investments",
        prompt: "Do you invest in tax-saving instruments (PPF, ELSS, NPS)?",
        kind: InputKind::SingleChoice,
        options: &[
            ChoiceOption { value: "regular", label: "Yes, regularly" },
            ChoiceOption { value: "small", label: "Small amounts occasionally" },
            ChoiceOption { value: "no", label: "No" },
        ],
        required: true,
        missing_message: "Please select your investment status.",
        help: None,
        visible_if: None,
    },
    Question {
        id: "entity_type",
        label: "Entity Type",
        prompt: "How is your business structured?",
        kind: InputKind::SingleChoice,
        options: &[
            ChoiceOption { value: "proprietorship", label: "Sole Proprietorship / Individual" },
            ChoiceOption { value: "partnership", label: "Partnership Firm" },
            ChoiceOption { value: "pvt_ltd", label: "Private Limited Company" },
            ChoiceOption { value: "llp", label: "Limited Liability Partnership" },
        ],
        required: true,
        missing_message: "Please select your entity type.",
        help: Some("Pvt Ltd triggers heavy compliance (audits, MCA filings)."),
        visible_if: None,
    },
    Question {
        id: "hire_freelancers",
        label: "Hires Freelancers",
        prompt: "Do you hire other freelancers or subcontractors?",
        kind: InputKind::SingleChoice,
        options: YES_NO,
        required: true,
        missing_message: "Do you hire freelancers?",
        help: None,
        visible_if: None,
    },
    Question {
        id: "pay_above_30k",
        label: "Pays Anyone Above ₹30k/year",
        prompt: "Do you pay any single person more than ₹30,000 in a year?",
        kind: InputKind::SingleChoice,
        options: YES_NO,
        required: true,
        missing_message: "Do you pay anyone > ₹30k/year?",
        help: Some("Professional fees above ₹30,000 attract TDS obligations."),
        visible_if: None,
    },
    Question {
        id: "documents",
        label: "Documents",
        prompt: "Upload any supporting documents (optional)",
        kind: InputKind::FileMarker,
        options: &[],
        required: false,
        missing_message: "",
        help: Some("Only file names are recorded."),
        visible_if: None,
    },
    Question {
        id: "other_info",
        label: "Other Information",
        prompt: "Anything else we should know about your situation?",
        kind: InputKind::LongText,
        options: &[],
        required: false,
        missing_message: "",
        help: None,
        visible_if: None,
    },
];

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_question_ids_are_unique() {
        let ids: HashSet<_> = QUESTIONS.iter().map(|q| q.id).collect();
        assert_eq!(ids.len(), QUESTIONS.len());
        assert_eq!(QUESTIONS.len(), 15);
    }

    #[test]
    fn test_choice_questions_have_options() {
        for q in QUESTIONS {
            assert_eq!(q.kind.is_choice(), !q.options.is_empty(), "{}", q.id);
            if q.required {
                assert!(!q.missing_message.is_empty(), "{}", q.id);
            }
        }
    }

    #[test]
    fn test_lut_only_visible_when_gst_registered() {
        let lut = QUESTIONS.iter().find(|q| q.id == "lut_filed").unwrap();
        let mut answers = AnswerSet::new();
        assert!(!lut.is_visible(&answers));

        answers.select("gst_number", "yes");
        assert!(lut.is_visible(&answers));

        answers.select("gst_number", "no");
        assert!(!lut.is_visible(&answers));
    }

    #[test]
    fn test_label_for_token() {
        let gst = QUESTIONS.iter().find(|q| q.id == "gst_number").unwrap();
        assert_eq!(gst.label_for("no"), Some("No"));
        assert_eq!(gst.label_for("maybe"), None);
        assert!(!gst.allows("maybe"));
    }
}
