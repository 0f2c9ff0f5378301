#![no_main]

use libfuzzer_sys::fuzz_target;
use statement_oracle::{Oracle, Statement};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let oracle = Oracle::with_defaults();
    let statement = Statement::new(text);

    let first = oracle.check_statement(&statement);
    let second = oracle.check_statement(&statement);
    assert_eq!(first.verdict, second.verdict);

    if let Ok(Some(query)) = oracle.normalize_query(&statement) {
        assert!(!query.text.is_empty());
    }
});
