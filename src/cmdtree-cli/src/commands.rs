//! Built-in shell commands.

use std::sync::Arc;

use cmdtree_core::{
    BooleanType, ChoiceType, CommandBuilder, CommandPermission, CommandTree, DispatcherSettings,
    GreedyStringType, IntegerType, ParameterNode, RegistrationError, WordType,
};
use parking_lot::Mutex;
use tracing::{debug, info};

/// The principal commands run as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellUser {
    pub name: String,
    pub admin: bool,
}

impl ShellUser {
    pub fn new(name: impl Into<String>, admin: bool) -> Self {
        Self {
            name: name.into(),
            admin,
        }
    }
}

/// Lines written by command actions, drained by the shell after each dispatch.
#[derive(Debug, Clone, Default)]
pub struct Output(Arc<Mutex<Vec<String>>>);

impl Output {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, line: impl Into<String>) {
        self.0.lock().push(line.into());
    }

    /// Takes every buffered line.
    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock())
    }
}

fn is_admin(user: &ShellUser) -> bool {
    user.admin
}

/// Builds the command tree served by the shell.
pub fn build_tree(
    settings: DispatcherSettings,
    output: &Output,
) -> Result<CommandTree<ShellUser>, RegistrationError> {
    let mut tree: CommandTree<ShellUser> = CommandTree::with_settings(settings)?;
    let team: Arc<Mutex<Vec<String>>> = Arc::default();

    let out = output.clone();
    tree.register(
        CommandBuilder::<ShellUser>::new("echo")
            .with_alias("say")
            .argument(ParameterNode::new("message", GreedyStringType))
            .with_description("Print a message")
            .with_action(move |ctx| {
                out.push(ctx.get_str("message").unwrap_or_default());
            }),
    )?;

    let out = output.clone();
    tree.register(
        CommandBuilder::<ShellUser>::new("give")
            .argument(
                ParameterNode::new("item", WordType::new())
                    .with_static_suggestions(["stone", "dirt", "diamond"]),
            )
            .argument(
                ParameterNode::new("amount", IntegerType::range(1, 64))
                    .with_default("1")
                    .with_static_suggestions(["1", "16", "32", "64"]),
            )
            .argument(ParameterNode::switch("silent"))
            .with_description("Give an item to yourself")
            .with_action(move |ctx| {
                let item = ctx.get_str("item").unwrap_or_default();
                let amount = ctx.get_i64("amount").unwrap_or(1);
                if !ctx.get_bool("silent").unwrap_or(false) {
                    out.push(format!(
                        "Gave {} x{} to {}",
                        item,
                        amount,
                        ctx.principal().name
                    ));
                }
            }),
    )?;

    let out = output.clone();
    tree.register(
        CommandBuilder::<ShellUser>::new("gamemode")
            .argument(ParameterNode::new(
                "mode",
                ChoiceType::new(["survival", "creative", "adventure", "spectator"]),
            ))
            .argument(ParameterNode::new("target", WordType::new()).optional())
            .with_description("Change game mode")
            .with_action(move |ctx| {
                let mode = ctx.get_str("mode").unwrap_or_default();
                let target = ctx
                    .get_str("target")
                    .filter(|t| !t.is_empty())
                    .unwrap_or(ctx.principal().name.as_str());
                out.push(format!("Set {}'s game mode to {}", target, mode));
            }),
    )?;

    let out = output.clone();
    tree.register(
        CommandBuilder::<ShellUser>::new("difficulty")
            .argument(
                ParameterNode::new(
                    "level",
                    ChoiceType::new(["peaceful", "easy", "normal", "hard"]),
                )
                .with_default("normal"),
            )
            .with_description("Set the difficulty")
            .with_action(move |ctx| {
                out.push(format!(
                    "Difficulty set to {}",
                    ctx.get_str("level").unwrap_or_default()
                ));
            }),
    )?;

    let (out, members) = (output.clone(), team.clone());
    tree.register(
        CommandBuilder::<ShellUser>::path("team add")
            .argument(ParameterNode::new("name", WordType::sized(3, 16)))
            .with_description("Add a team member")
            .with_action(move |ctx| {
                let name = ctx.get_str("name").unwrap_or_default();
                let mut members = members.lock();
                if members.iter().any(|m| m == name) {
                    out.push(format!("{} is already on the team", name));
                } else {
                    members.push(name.to_string());
                    out.push(format!("Added {}", name));
                }
            }),
    )?;

    let (out, members) = (output.clone(), team.clone());
    tree.register(
        CommandBuilder::<ShellUser>::path("team remove")
            .argument(ParameterNode::new("name", WordType::new()))
            .with_description("Remove a team member")
            .with_action(move |ctx| {
                let name = ctx.get_str("name").unwrap_or_default();
                let mut members = members.lock();
                let before = members.len();
                members.retain(|m| m != name);
                if members.len() == before {
                    out.push(format!("{} is not on the team", name));
                } else {
                    out.push(format!("Removed {}", name));
                }
            }),
    )?;

    let (out, members) = (output.clone(), team);
    tree.register(
        CommandBuilder::<ShellUser>::path("team list")
            .with_description("List team members")
            .with_action(move |_| {
                let members = members.lock();
                if members.is_empty() {
                    out.push("The team is empty");
                } else {
                    out.push(members.join(", "));
                }
            }),
    )?;

    let out = output.clone();
    tree.register(
        CommandBuilder::<ShellUser>::path("admin ban")
            .argument(ParameterNode::new("player", WordType::new()))
            .argument(
                ParameterNode::flag("days", IntegerType::range(1, 365))
                    .with_default("1")
                    .with_description("Ban length in days"),
            )
            .argument(ParameterNode::flag("reason", WordType::new()).optional())
            .argument(ParameterNode::switch("silent"))
            .with_requirement(is_admin)
            .with_description("Ban a player")
            .with_action(move |ctx| {
                let player = ctx.get_str("player").unwrap_or_default();
                let days = ctx.get_i64("days").unwrap_or(1);
                let reason = ctx.get_str("reason").filter(|r| !r.is_empty());
                info!("{} banned {} for {} day(s)", ctx.principal().name, player, days);
                if ctx.get_bool("silent").unwrap_or(false) {
                    return;
                }
                match reason {
                    Some(reason) => {
                        out.push(format!("Banned {} for {} day(s): {}", player, days, reason))
                    }
                    None => out.push(format!("Banned {} for {} day(s)", player, days)),
                }
            }),
    )?;

    let out = output.clone();
    tree.register(
        CommandBuilder::<ShellUser>::path("admin debug")
            .argument(ParameterNode::new("enabled", BooleanType))
            .with_requirement(is_admin)
            .secret()
            .with_description("Toggle debug mode")
            .with_action(move |ctx| {
                let enabled = ctx.get_bool("enabled").unwrap_or(false);
                out.push(format!("Debug mode {}", if enabled { "on" } else { "off" }));
            }),
    )?;

    // Usage lines are collected last so `help` sees everything above.
    let usages: Vec<(String, Option<String>, CommandPermission<ShellUser>)> = tree
        .commands()
        .iter()
        .filter(|command| !command.is_secret())
        .map(|command| {
            (
                tree.usage(command),
                command.description().map(str::to_string),
                command.permission().clone(),
            )
        })
        .collect();
    let out = output.clone();
    tree.register(
        CommandBuilder::<ShellUser>::new("help")
            .with_description("List available commands")
            .with_action(move |ctx| {
                for (usage, description, permission) in &usages {
                    if !permission.is_executable_by(ctx.principal()) {
                        continue;
                    }
                    match description {
                        Some(description) => out.push(format!("{:<40} {}", usage, description)),
                        None => out.push(usage.clone()),
                    }
                }
            }),
    )?;

    debug!("Registered {} commands ({} nodes)", tree.len(), tree.node_count());
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn setup() -> (CommandTree<ShellUser>, Output) {
        let output = Output::new();
        let tree = build_tree(DispatcherSettings::default(), &output).unwrap();
        (tree, output)
    }

    #[test]
    fn test_give_defaults() {
        let (tree, output) = setup();
        let guest = ShellUser::new("alex", false);
        tree.dispatch(&guest, "give stone").unwrap();
        tree.dispatch(&guest, "give dirt 5 --silent").unwrap();
        assert_eq!(output.drain(), vec!["Gave stone x1 to alex"]);
    }

    #[test]
    fn test_echo_alias() {
        let (tree, output) = setup();
        let guest = ShellUser::new("alex", false);
        tree.dispatch(&guest, "say hello   world").unwrap();
        assert_eq!(output.drain(), vec!["hello   world"]);
    }

    #[test]
    fn test_gamemode_target() {
        let (tree, output) = setup();
        let guest = ShellUser::new("alex", false);
        tree.dispatch(&guest, "gamemode creative").unwrap();
        tree.dispatch(&guest, "gamemode spectator sam").unwrap();
        assert_eq!(
            output.drain(),
            vec![
                "Set alex's game mode to creative",
                "Set sam's game mode to spectator"
            ]
        );
    }

    #[test]
    fn test_choice_default() {
        let (tree, output) = setup();
        let guest = ShellUser::new("alex", false);
        tree.dispatch(&guest, "difficulty").unwrap();
        tree.dispatch(&guest, "difficulty HARD").unwrap();
        assert_eq!(
            output.drain(),
            vec!["Difficulty set to normal", "Difficulty set to hard"]
        );
    }

    #[test]
    fn test_team_state() {
        let (tree, output) = setup();
        let guest = ShellUser::new("alex", false);
        for line in ["team list", "team add sam", "team add sam", "team add robin", "team list"] {
            tree.dispatch(&guest, line).unwrap();
        }
        tree.dispatch(&guest, "team remove sam").unwrap();
        tree.dispatch(&guest, "team remove sam").unwrap();
        assert_eq!(
            output.drain(),
            vec![
                "The team is empty",
                "Added sam",
                "sam is already on the team",
                "Added robin",
                "sam, robin",
                "Removed sam",
                "sam is not on the team",
            ]
        );
    }

    #[test]
    fn test_admin_ban() {
        let (tree, output) = setup();
        let root = ShellUser::new("root", true);
        tree.dispatch(&root, "admin ban griefer -d 7 --reason spam").unwrap();
        tree.dispatch(&root, "admin ban griefer").unwrap();
        tree.dispatch(&root, "admin ban griefer -s").unwrap();
        assert_eq!(
            output.drain(),
            vec![
                "Banned griefer for 7 day(s): spam",
                "Banned griefer for 1 day(s)"
            ]
        );
    }

    #[test]
    fn test_admin_hidden_from_guests() {
        let (tree, output) = setup();
        let guest = ShellUser::new("alex", false);
        assert!(tree.dispatch(&guest, "admin ban griefer").is_err());
        assert!(tree.complete(&guest, "ad").is_empty());
        tree.dispatch(&guest, "help").unwrap();
        let help = output.drain();
        assert!(help.iter().any(|line| line.starts_with("give <item> [amount]")));
        assert!(!help.iter().any(|line| line.starts_with("admin")));
    }

    #[test]
    fn test_secret_command_not_listed() {
        let (tree, output) = setup();
        let root = ShellUser::new("root", true);
        assert_eq!(tree.complete(&root, "admin "), vec!["ban"]);
        tree.dispatch(&root, "admin debug true").unwrap();
        tree.dispatch(&root, "help").unwrap();
        let lines = output.drain();
        assert_eq!(lines[0], "Debug mode on");
        assert!(lines.iter().any(|line| line.starts_with("admin ban")));
        assert!(!lines.iter().any(|line| line.starts_with("admin debug")));
    }
}
