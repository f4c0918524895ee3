//! Creates a handful of reporters, calls each of them and lets them go out of scope,
//! printing the full lifecycle to standard error.

use lifecycle_reporter::Reporter;

fn main() {
    let mut r1 = Reporter::<u64>::new();
    let mut r2 = r1.clone();
    let mut r3 = r2.clone();
    let mut r4 = r1.take();
    let mut r5 = Reporter::<u64>::new();

    r1.call_mut(());
    r2.call_mut(());
    r3.call_mut(());
    r4.call_mut(());
    r5.call_mut(());

    // Destruction is reported in reverse declaration order as the reporters go out of scope.
}
