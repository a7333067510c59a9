pub mod alarm;
pub mod appsettings;
pub mod scheduling;
pub mod storage;
pub mod validation;
