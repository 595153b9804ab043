pub mod attendance_mark;
pub mod device_day_binding;
pub mod exam;
pub mod lecture;
pub mod presence_token;
pub mod student;

pub use attendance_mark::Entity as AttendanceMark;
pub use device_day_binding::Entity as DeviceDayBinding;
pub use exam::Entity as Exam;
pub use lecture::Entity as Lecture;
pub use presence_token::Entity as PresenceToken;
pub use student::Entity as Student;
