/// Compile a regular expression once and hand out a `&'static Regex`.
///
/// Only used with literal patterns, so a failed compile is a programming error
/// caught by the first test that reaches the call site.
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}
