pub mod engagementdtos;
