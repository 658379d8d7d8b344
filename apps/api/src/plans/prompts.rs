// All LLM prompt constants for the compliance plan.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System instruction for plan generation.
pub const PLAN_SYSTEM: &str = "You are an expert Indian Chartered Accountant (CA) specializing \
    in cross-border taxation for freelancers and SMBs. Your responses must be specific to \
    Indian tax law (FY 2024-25), action-oriented, risk-aware, and practical.";

/// Task outline appended after the user profile.
pub const PLAN_TASK: &str = r#"# Task

Generate a comprehensive, step-by-step compliance plan for this Indian freelancer/SMB. The plan must include:

## 1. Registration & Setup
- GST registration requirement (mandatory/optional/exempt)
- LUT filing requirement (if GST registered)
- MSME/UDYAM registration recommendation
- Tax regime applicability (44ADA/44AD/Regular)

## 2. Client Onboarding Documents
- Forms required for each client country (W-8BEN, TRC, etc.)
- Where to get these forms
- How to fill them (key sections)
- Renewal timelines

## 3. Payment & Invoicing Protocol
- Invoice format requirements
- Proof documents needed (FIRC/FIRA)
- Forex loss/gain handling
- GST rate to charge (0% export vs 18% domestic)

## 4. Annual Tax Filing
- ITR form type (ITR-2/ITR-3/ITR-4)
- Tax calculation method (presumptive/regular)
- Advance tax deadlines (15 Jun, 15 Sep, 15 Dec, 15 Mar)
- Audit requirement (Yes/No + Section)

## 5. Critical Alerts
- Address every flagged alert above and any other compliance gap in the profile.

## 6. Edge Case Warnings
- Consider specific risks like 'Intermediary Services', 'Crypto Tax', or 'PayPal FIRA issues' based on the inputs.

## 7. Estimated Tax Liability
- Calculate approximate tax based on turnover and tax regime
- Show breakdown (Income Tax + GST + TDS if applicable)

## 8. Next 30 Days Action Items
- Prioritized checklist with deadlines
- Cost estimates for CA fees, registrations, etc."#;
