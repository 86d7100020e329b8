// tests/arg_line_properties.rs

use proptest::prelude::*;
use runexe::exec::{InvocationRequest, split_arg_line};

proptest! {
    #[test]
    fn split_never_yields_empty_or_whitespace_args(line in "\\PC{0,64}") {
        for arg in split_arg_line(&line) {
            prop_assert!(!arg.is_empty());
            prop_assert!(!arg.chars().any(char::is_whitespace));
        }
    }

    #[test]
    fn joined_words_split_back(words in proptest::collection::vec("[a-zA-Z0-9_./=-]{1,12}", 0..8),
                               sep in "[ \t]{1,3}") {
        let line = words.join(&sep);
        prop_assert_eq!(split_arg_line(&line), words.clone());

        let req = InvocationRequest::from_command_line("/bin/tool", &line).unwrap();
        prop_assert_eq!(req.args(), words.as_slice());
    }
}
