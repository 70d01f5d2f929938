pub mod engagementmodel;
pub mod usermodel;
