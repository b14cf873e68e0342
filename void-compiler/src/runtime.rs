//! Runtime support routines for compiled programs.

/// Bounds check for the future slice support, exported with C ABI so
/// generated code can call it by name.
///
/// Unwinding across the C boundary is not an option, so an out-of-range
/// index aborts the process after printing a diagnostic.
#[no_mangle]
pub extern "C" fn bounds_check(index: i32, length: i32) {
    if index < 0 || index >= length {
        eprintln!("Index {index} out of bounds for length {length}");
        std::process::abort();
    }
}
