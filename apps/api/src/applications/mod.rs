// Application intake, review, and offer-letter flows over the single
// `applications` table plus the local upload store.

pub mod handlers;
pub mod intake;
pub mod queries;
