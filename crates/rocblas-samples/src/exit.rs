// Exit codes. A FAIL verdict is reported on stdout but still exits 0.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_GENERIC_FAIL: i32 = 1;
pub const EXIT_USAGE: i32 = 2;
