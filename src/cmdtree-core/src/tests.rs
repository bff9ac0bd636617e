//! Tests for the command tree as a whole.
//!
//! Coverage for:
//! 1. Dispatch of literal, positional and flag paths
//! 2. Quoting through the full pipeline
//! 3. Permission checks
//! 4. Flag layout growth
//! 5. Completion consistency
//! 6. Sharing one tree across threads

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::*;

/// A parameter type that must never be asked to parse.
struct PanickingType;

impl<A> ParameterType<A> for PanickingType {
    fn parse(
        &self,
        _input: &mut StringStream,
        _context: &ExecutionContext<'_, A>,
    ) -> Result<Value, ParseFailure> {
        panic!("parser invoked past a denied node");
    }

    fn value_kind(&self) -> ValueKind {
        ValueKind::Text
    }
}

#[derive(Debug, Clone)]
struct User {
    admin: bool,
}

fn user() -> User {
    User { admin: false }
}

fn admin() -> User {
    User { admin: true }
}

// ============================================================================
// Dispatch Tests
// ============================================================================

mod dispatch_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_literal_only_paths_bind_with_empty_context() {
        let mut tree = CommandTree::<User>::new();
        for path in ["help", "team list", "team info all"] {
            tree.register(CommandBuilder::path(path)).unwrap();
        }

        let principal = user();
        for path in ["help", "team list", "team info all"] {
            let ctx = tree.dispatch(&principal, path).unwrap();
            assert!(ctx.is_empty(), "{path} resolved values");
            assert_eq!(ctx.command().unwrap().usage(), path);
            assert!(!ctx.principal().admin);
        }
    }

    #[test]
    fn test_omitted_optionals_take_defaults() {
        let mut tree = CommandTree::<User>::new();
        tree.register(
            CommandBuilder::new("spawn")
                .argument(ParameterNode::new("mob", WordType::new()))
                .argument(ParameterNode::new("count", IntegerType::new()).with_default("3"))
                .argument(
                    ParameterNode::new("mood", ChoiceType::new(["calm", "angry"]))
                        .with_default("calm"),
                ),
        )
        .unwrap();

        let principal = user();
        let ctx = tree.parse(&principal, "spawn zombie").unwrap();
        assert_eq!(ctx.get_i64("count"), Some(3));
        assert_eq!(ctx.get_str("mood"), Some("calm"));

        let ctx = tree.parse(&principal, "spawn zombie 5").unwrap();
        assert_eq!(ctx.get_i64("count"), Some(5));
        assert_eq!(ctx.get_str("mood"), Some("calm"));
    }

    #[test]
    fn test_optional_without_default_takes_zero_value() {
        let mut tree = CommandTree::<User>::new();
        tree.register(
            CommandBuilder::new("wait")
                .argument(ParameterNode::new("seconds", DecimalType::new()).optional())
                .argument(ParameterNode::new("label", WordType::new()).optional()),
        )
        .unwrap();
        let principal = user();
        let ctx = tree.parse(&principal, "wait").unwrap();
        assert_eq!(ctx.get_f64("seconds"), Some(0.0));
        assert!(!ctx.contains("label"));
    }

    #[test]
    fn test_required_flag_order_is_free() {
        let mut tree = CommandTree::<User>::new();
        tree.register(
            CommandBuilder::new("pair")
                .argument(ParameterNode::flag("a", IntegerType::new()))
                .argument(ParameterNode::flag("b", IntegerType::new())),
        )
        .unwrap();

        let principal = user();
        for input in ["pair --a 1 --b 2", "pair --b 2 --a 1", "pair -b 2 -a 1"] {
            let ctx = tree.parse(&principal, input).unwrap();
            assert_eq!(ctx.get_i64("a"), Some(1), "{input}");
            assert_eq!(ctx.get_i64("b"), Some(2), "{input}");
        }

        let err = tree.parse(&user(), "pair --a 1").unwrap_err();
        assert_eq!(err.kind, FailureKind::MissingArgument("b".to_string()));
    }

    #[test]
    fn test_short_bundle_equals_separate_switches() {
        let mut tree = CommandTree::<User>::new();
        tree.register(
            CommandBuilder::new("ls")
                .argument(ParameterNode::new("path", WordType::new()))
                .argument(ParameterNode::switch("all"))
                .argument(ParameterNode::switch("brief")),
        )
        .unwrap();

        let principal = user();
        let bundled = tree.parse(&principal, "ls /tmp -ab").unwrap();
        let separate = tree.parse(&principal, "ls /tmp -a -b").unwrap();
        let reversed = tree.parse(&principal, "ls /tmp -ba").unwrap();
        for ctx in [&bundled, &separate, &reversed] {
            assert_eq!(ctx.get_bool("all"), Some(true));
            assert_eq!(ctx.get_bool("brief"), Some(true));
        }
    }

    #[test]
    fn test_flags_mixed_with_optional_positional() {
        let mut tree = CommandTree::<User>::new();
        tree.register(
            CommandBuilder::new("log")
                .argument(ParameterNode::new("lines", IntegerType::new()).with_default("20"))
                .argument(ParameterNode::switch("follow")),
        )
        .unwrap();

        let principal = user();
        let ctx = tree.parse(&principal, "log --follow").unwrap();
        assert_eq!(ctx.get_i64("lines"), Some(20));
        assert_eq!(ctx.get_bool("follow"), Some(true));

        let ctx = tree.parse(&principal, "log 5 -f").unwrap();
        assert_eq!(ctx.get_i64("lines"), Some(5));
    }

    #[test]
    fn test_chained_flags_accept_subsets_in_order() {
        let mut tree = CommandTree::<User>::new();
        let mut builder = CommandBuilder::new("build");
        for name in ["alpha", "bravo", "charlie", "delta", "echo"] {
            builder = builder.argument(ParameterNode::switch(name));
        }
        tree.register(builder).unwrap();

        let principal = user();
        let ctx = tree.parse(&principal, "build --bravo --delta").unwrap();
        assert_eq!(ctx.get_bool("alpha"), Some(false));
        assert_eq!(ctx.get_bool("bravo"), Some(true));
        assert_eq!(ctx.get_bool("delta"), Some(true));

        let ctx = tree.parse(&principal, "build -abcde").unwrap();
        assert!(ctx.values().all(|(_, value)| value == &Value::Bool(true)));

        // Above the threshold optional flags follow declaration order.
        assert!(tree.parse(&user(), "build --delta --bravo").is_err());
    }

    #[test]
    fn test_aliases_dispatch_to_same_identity() {
        let mut tree = CommandTree::<User>::new();
        let id = tree
            .register(CommandBuilder::new("teleport").with_alias("tp").argument(
                ParameterNode::new("target", WordType::new()),
            ))
            .unwrap();

        let principal = user();
        let long = tree.parse(&principal, "teleport steve").unwrap();
        let short = tree.parse(&principal, "tp steve").unwrap();
        assert_eq!(long.command().unwrap().id(), id);
        assert_eq!(short.command().unwrap().id(), id);
    }

    #[test]
    fn test_secret_command_still_dispatches() {
        let mut tree = CommandTree::<User>::new();
        tree.register(CommandBuilder::new("debug").secret()).unwrap();
        assert!(tree.parse(&user(), "debug").is_ok());
        assert!(tree.complete(&user(), "deb").is_empty());
    }
}

// ============================================================================
// Quoting Tests
// ============================================================================

mod quoting_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tree() -> CommandTree<User> {
        let mut tree = CommandTree::new();
        tree.register(CommandBuilder::new("say").argument(ParameterNode::new("message", WordType::new())))
            .unwrap();
        tree
    }

    #[test]
    fn test_quoted_segment_is_one_token() {
        let principal = user();
        let ctx = tree().parse(&principal, r#"say "hello world""#).unwrap();
        assert_eq!(ctx.get_str("message"), Some("hello world"));
    }

    #[test]
    fn test_unterminated_quote_points_at_opening_quote() {
        let err = tree().parse(&user(), r#"say "hello world"#).unwrap_err();
        assert_eq!(err.kind, FailureKind::UnclosedQuote);
        assert_eq!(err.position, 4);
        assert_eq!(err.node.as_deref(), Some("message"));
    }

    #[test]
    fn test_invalid_escape_is_reported() {
        let err = tree().parse(&user(), r#"say "a\tb""#).unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidEscapeCharacter('t'));
    }

    #[test]
    fn test_text_after_closing_quote() {
        let err = tree().parse(&user(), r#"say "a"b"#).unwrap_err();
        assert_eq!(err.kind, FailureKind::ExpectedWhitespace);
    }
}

// ============================================================================
// Permission Tests
// ============================================================================

mod permission_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_denied_first_node_never_parses_further() {
        let mut tree = CommandTree::<User>::new();
        tree.register(
            CommandBuilder::new("nuke")
                .with_requirement(|user: &User| user.admin)
                .argument(ParameterNode::new("target", PanickingType)),
        )
        .unwrap();

        let err = tree.dispatch(&user(), "nuke everything").unwrap_err();
        assert_eq!(err.kind, FailureKind::NoPermission);
        assert_eq!(err.node.as_deref(), Some("nuke"));
        assert_eq!(err.position, 0);
    }

    #[test]
    fn test_denial_stops_sibling_commands() {
        let mut tree = CommandTree::<User>::new();
        tree.register(
            CommandBuilder::new("kick").argument(
                ParameterNode::new("player", ChoiceType::new(["steve"]))
                    .with_permission(CommandPermission::new(|user: &User| user.admin)),
            ),
        )
        .unwrap();
        tree.register(CommandBuilder::new("kick").argument(ParameterNode::new("reason", PanickingType)))
            .unwrap();

        let err = tree.parse(&user(), "kick steve").unwrap_err();
        assert_eq!(err.kind, FailureKind::NoPermission);
        assert_eq!(err.node.as_deref(), Some("player"));
    }

    #[test]
    fn test_merged_literal_still_checks_bound_command() {
        let mut tree = CommandTree::<User>::new();
        tree.register(
            CommandBuilder::path("server stop").with_requirement(|user: &User| user.admin),
        )
        .unwrap();
        tree.register(CommandBuilder::path("server status")).unwrap();

        assert!(tree.parse(&user(), "server status").is_ok());
        let err = tree.parse(&user(), "server stop").unwrap_err();
        assert_eq!(err.kind, FailureKind::NoPermission);
        assert!(tree.parse(&admin(), "server stop").is_ok());
    }

    #[test]
    fn test_action_not_run_when_denied() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        let mut tree = CommandTree::<User>::new();
        tree.register(
            CommandBuilder::new("reset")
                .with_requirement(|user: &User| user.admin)
                .with_action(move |_| flag.store(true, Ordering::SeqCst)),
        )
        .unwrap();

        assert!(tree.dispatch(&user(), "reset").is_err());
        assert!(!ran.load(Ordering::SeqCst));
        assert!(tree.dispatch(&admin(), "reset").is_ok());
        assert!(ran.load(Ordering::SeqCst));
    }
}

// ============================================================================
// Flag Layout Tests
// ============================================================================

mod layout_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn switches(count: usize, settings: DispatcherSettings) -> CommandTree<User> {
        let mut tree = CommandTree::with_settings(settings).unwrap();
        let mut builder = CommandBuilder::new("cmd");
        for i in 0..count {
            let name = format!("flag{i}");
            let shorthand = char::from(b'a' + i as u8);
            builder = builder.argument(ParameterNode::switch(name).with_shorthand(shorthand));
        }
        tree.register(builder).unwrap();
        tree
    }

    #[test]
    fn test_growth_is_linear_above_threshold() {
        let counts: Vec<usize> = (5..=9)
            .map(|n| switches(n, DispatcherSettings::default()).node_count())
            .collect();
        assert_eq!(counts, vec![7, 8, 9, 10, 11]);
    }

    #[test]
    fn test_threshold_is_configurable() {
        let settings = DispatcherSettings::default().with_permutation_threshold(5);
        // 5 + 20 + 60 + 120 + 120 ordering prefixes
        assert_eq!(switches(5, settings).node_count(), 2 + 325);
    }

    #[test]
    fn test_every_order_accepted_at_threshold() {
        let tree = switches(4, DispatcherSettings::default());
        for input in ["cmd -dcba", "cmd -b -d", "cmd --flag3 --flag0", "cmd"] {
            assert!(tree.parse(&user(), input).is_ok(), "{input}");
        }
    }

    fn chained(required: &[&str], optional: &[&str]) -> CommandTree<User> {
        let mut tree = CommandTree::new();
        let mut builder = CommandBuilder::new("cmd");
        for name in required {
            builder = builder.argument(ParameterNode::flag(*name, IntegerType::new()));
        }
        for name in optional {
            builder = builder.argument(ParameterNode::switch(*name));
        }
        tree.register(builder).unwrap();
        tree
    }

    #[test]
    fn test_chain_requires_required_flags_in_declaration_order() {
        let tree = chained(&["first", "second"], &["alpha", "bravo", "charlie", "delta"]);
        let principal = user();

        let ctx = tree
            .parse(&principal, "cmd --first 1 --second 2 --bravo --delta")
            .unwrap();
        assert_eq!(ctx.get_i64("first"), Some(1));
        assert_eq!(ctx.get_i64("second"), Some(2));
        assert_eq!(ctx.get_bool("alpha"), Some(false));
        assert_eq!(ctx.get_bool("bravo"), Some(true));
        assert_eq!(ctx.get_bool("delta"), Some(true));

        let ctx = tree.parse(&principal, "cmd --first 1 --second 2").unwrap();
        assert!(ctx.values().all(|(name, value)| {
            name == "first" || name == "second" || value == &Value::Bool(false)
        }));

        assert!(tree.parse(&principal, "cmd --first 1").is_err());
        assert!(tree.parse(&principal, "cmd --second 2 --first 1").is_err());
        assert!(
            tree.parse(&principal, "cmd --first 1 --second 2 --delta --bravo")
                .is_err()
        );
    }

    #[test]
    fn test_completion_ignores_chain_order() {
        let tree = chained(&[], &["alpha", "bravo", "charlie", "delta", "echo"]);
        let principal = user();

        // Completion offers every unused flag, the chain only later ones.
        let suggestions = tree.complete(&principal, "cmd --echo ");
        assert!(suggestions.contains(&"--alpha".to_string()));
        assert!(!suggestions.contains(&"--echo".to_string()));
        assert!(tree.parse(&principal, "cmd --echo --alpha").is_err());
        assert!(tree.parse(&principal, "cmd --alpha --echo").is_ok());
    }
}

// ============================================================================
// Completion Tests
// ============================================================================

mod completion_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tree() -> CommandTree<User> {
        let mut tree = CommandTree::new();
        tree.register(CommandBuilder::path("gamerule list")).unwrap();
        tree.register(CommandBuilder::path("gamemode survival")).unwrap();
        tree.register(CommandBuilder::path("gamemode creative")).unwrap();
        tree.register(CommandBuilder::path("give")).unwrap();
        tree
    }

    #[test]
    fn test_literal_round_trip() {
        let tree = tree();
        assert_eq!(tree.complete(&user(), "gamem"), vec!["gamemode"]);
        assert_eq!(tree.complete(&user(), "game"), vec!["gamerule", "gamemode"]);
        assert_eq!(
            tree.complete(&user(), "gamemode "),
            vec!["survival", "creative"]
        );
        assert_eq!(tree.complete(&user(), "gamemode c"), vec!["creative"]);
    }

    #[test]
    fn test_completion_is_idempotent() {
        let tree = tree();
        let nodes = tree.node_count();
        let first = tree.complete(&user(), "gamemode ");
        let second = tree.complete(&user(), "gamemode ");
        assert_eq!(first, second);
        assert_eq!(tree.node_count(), nodes);
    }

    #[test]
    fn test_completion_matches_dispatch() {
        let tree = tree();
        for suggestion in tree.complete(&user(), "gamemode ") {
            let line = format!("gamemode {suggestion}");
            assert!(tree.parse(&user(), &line).is_ok(), "{line}");
        }
    }

    #[test]
    fn test_literal_continue_is_case_sensitive() {
        let tree = tree();
        assert!(tree.complete(&user(), "GAMEMODE ").is_empty());
    }
}

// ============================================================================
// Concurrency Tests
// ============================================================================

mod concurrency_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_tree_is_send_and_sync() {
        assert_send_sync::<CommandTree<User>>();
    }

    #[test]
    fn test_parallel_dispatch_on_shared_tree() {
        let mut tree = CommandTree::<User>::new();
        tree.register(
            CommandBuilder::new("add")
                .argument(ParameterNode::new("a", IntegerType::new()))
                .argument(ParameterNode::new("b", IntegerType::new())),
        )
        .unwrap();
        let tree = tree;

        std::thread::scope(|scope| {
            for i in 0..8_i64 {
                let tree = &tree;
                scope.spawn(move || {
                    let principal = user();
                    for j in 0..50_i64 {
                        let ctx = tree.parse(&principal, &format!("add {i} {j}")).unwrap();
                        assert_eq!(ctx.get_i64("a").unwrap() + ctx.get_i64("b").unwrap(), i + j);
                        assert_eq!(tree.complete(&principal, "ad"), vec!["add"]);
                    }
                });
            }
        });
    }
}

// ============================================================================
// Convenience Function Tests
// ============================================================================

mod convenience_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_free_functions() {
        let mut tree = CommandTree::<User>::new();
        let commands = CommandBuilder::new("ping").build(CommandId(99)).unwrap();
        for command in commands {
            insert(&mut tree, command).unwrap();
        }
        assert!(dispatch(&tree, &user(), "ping").is_ok());
        assert_eq!(complete(&tree, &user(), "p"), vec!["ping"]);
    }
}
