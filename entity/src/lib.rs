pub mod company;
pub mod contact;
pub mod deal;

pub use company::Company;
pub use contact::Contact;
pub use deal::{Deal, Stage};
