#[cfg(test)]
mod scanner_tests {
    use loxide::scanner::Scanner;
    use loxide::token::{Token, TokenType};

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source);
        let tokens: Vec<Token> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn symbols() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn compound_operators() {
        assert_token_sequence(
            "! != = == < <= > >=",
            &[
                (TokenType::BANG, "!"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL, "="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::LESS, "<"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER, ">"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_token_sequence(
            "class classy and android _under x1",
            &[
                (TokenType::CLASS, "class"),
                (TokenType::IDENTIFIER, "classy"),
                (TokenType::AND, "and"),
                (TokenType::IDENTIFIER, "android"),
                (TokenType::IDENTIFIER, "_under"),
                (TokenType::IDENTIFIER, "x1"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn string_literal_payload() {
        let tokens: Vec<Token> = Scanner::new("\"hello world\"")
            .filter_map(Result::ok)
            .collect();

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].lexeme, "\"hello world\"");

        match &tokens[0].token_type {
            TokenType::STRING(s) => assert_eq!(s, "hello world"),
            other => panic!("expected STRING, got {:?}", other),
        }
    }

    #[test]
    fn multiline_string_advances_line() {
        let tokens: Vec<Token> = Scanner::new("\"a\nb\"").filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].line, 2);
        assert_eq!(tokens[1].token_type, TokenType::EOF);
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn unterminated_string_reports_error() {
        let results: Vec<_> = Scanner::new("\"abc").collect();

        assert_eq!(results.len(), 2);
        let error = results[0].as_ref().expect_err("expected a lex error");
        assert!(error.to_string().contains("Unterminated string."));
        assert!(results[1].is_ok());
    }

    #[test]
    fn number_literals() {
        let tokens: Vec<Token> = Scanner::new("12 12.5 1.").filter_map(Result::ok).collect();

        // The trailing dot is not part of the number.
        assert_eq!(tokens.len(), 5);

        match tokens[0].token_type {
            TokenType::NUMBER(n) => assert_eq!(n, 12.0),
            ref other => panic!("expected NUMBER, got {:?}", other),
        }

        match tokens[1].token_type {
            TokenType::NUMBER(n) => assert_eq!(n, 12.5),
            ref other => panic!("expected NUMBER, got {:?}", other),
        }

        assert_eq!(tokens[2].token_type, TokenType::NUMBER(0.0));
        assert_eq!(tokens[3].token_type, TokenType::DOT);
        assert_eq!(tokens[4].token_type, TokenType::EOF);
    }

    #[test]
    fn comments_skipped_to_end_of_line() {
        assert_token_sequence(
            "// nothing here\n42",
            &[(TokenType::NUMBER(0.0), "42"), (TokenType::EOF, "")],
        );

        let tokens: Vec<Token> = Scanner::new("// only a comment")
            .filter_map(Result::ok)
            .collect();

        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].token_type, TokenType::EOF);
    }

    #[test]
    fn slash_still_tokenizes() {
        assert_token_sequence(
            "1 / 2",
            &[
                (TokenType::NUMBER(0.0), "1"),
                (TokenType::SLASH, "/"),
                (TokenType::NUMBER(0.0), "2"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn unexpected_chars_interleave_with_tokens() {
        let results: Vec<_> = Scanner::new(",.$(#").collect();

        // COMMA, DOT, error for '$', LEFT_PAREN, error for '#', EOF.
        assert_eq!(results.len(), 6);

        let error_count = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(error_count, 2);

        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(
                err.to_string().contains("Unexpected character."),
                "unexpected message: {}",
                err
            );
        }

        assert!(matches!(
            results[5].as_ref().map(|t| t.token_type.clone()),
            Ok(TokenType::EOF)
        ));
    }

    #[test]
    fn every_input_terminates_with_eof() {
        for source in ["", "   \t\r\n", "@#$", "\"open", "var x = 1;"] {
            let tokens: Vec<Token> = Scanner::new(source).filter_map(Result::ok).collect();

            let last = tokens.last().expect("scanner must always emit EOF");
            assert_eq!(last.token_type, TokenType::EOF);
        }
    }
}
