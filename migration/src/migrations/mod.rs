pub mod m202608010001_create_registry;
pub mod m202608010002_create_presence_tokens;
pub mod m202608010003_create_attendance_marks;
pub mod m202608010004_create_device_day_bindings;
