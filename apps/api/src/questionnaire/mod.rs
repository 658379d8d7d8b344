// Freelancer tax questionnaire: static question graph, navigation, validation,
// alert rules and draft snapshots. Everything except drafts is a pure function
// of the posted Answer Set.

pub mod alerts;
pub mod answers;
pub mod drafts;
pub mod handlers;
pub mod navigation;
pub mod schema;
pub mod snapshot;
pub mod validation;
