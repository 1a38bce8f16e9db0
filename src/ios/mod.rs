//! Cisco IOS configuration grammar.
//!
//! [`IosParser`] drives the generic [`ContextParser`] with the IOS command
//! table from [`commands`] and hands back the finished [`ConfigTree`].
//!
//! # Example
//!
//! ```rust,ignore
//! use netcontext::ios::IosParser;
//!
//! let tree = IosParser::new()?.parse(&text)?;
//! if let Some(desc) = tree.attribute("interfaces", "Gi0/1", "description") {
//!     println!("{}", desc.as_str().unwrap_or_default());
//! }
//! ```

pub mod acl;
pub mod commands;
pub mod normalize;

pub use acl::{normalize_ext_rule, normalize_v6_rule, service_to_port, PendingBlock, StdRule};
pub use normalize::{expand_set, interface_name};

use crate::error::Result;
use crate::parser::{Action, ContextParser, ParseStats, ParseTarget};
use crate::tree::{list_entry, path_entry, ConfigTree, Map, Value};
use acl::StdAclBuffer;
use std::fmt;
use tracing::debug;

/// Context for lines inside `vlan <tag>`.
pub const VLAN_CONTEXT: &str = "vlan";
/// Context for lines inside `interface <name>`.
pub const INTERFACE_CONTEXT: &str = "interface";
/// Context for lines inside `ip access-list standard <name>`.
pub const ACL4_STD_CONTEXT: &str = "acl4-std";
/// Context for lines inside `ip access-list extended <name>`.
pub const ACL4_EXT_CONTEXT: &str = "acl4-ext";
/// Context for lines inside `ipv6 access-list <name>`.
pub const ACL6_CONTEXT: &str = "acl6";

/// The object a block's lines apply to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Focus {
    Vlan(u32),
    Interface(String),
    Acl4Std(String),
    Acl4Ext(String),
    Acl6(String),
}

impl Focus {
    /// Top-level section the object lives in.
    pub fn section(&self) -> &'static str {
        match self {
            Focus::Vlan(_) => "vlans",
            Focus::Interface(_) => "interfaces",
            Focus::Acl4Std(_) => "acl4-std",
            Focus::Acl4Ext(_) => "acl4-ext",
            Focus::Acl6(_) => "acl6",
        }
    }

    /// Key of the object within its section.
    pub fn id(&self) -> String {
        match self {
            Focus::Vlan(tag) => tag.to_string(),
            Focus::Interface(name)
            | Focus::Acl4Std(name)
            | Focus::Acl4Ext(name)
            | Focus::Acl6(name) => name.clone(),
        }
    }
}

impl fmt::Display for Focus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.section(), self.id())
    }
}

/// Params carried into IOS blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IosParams {
    /// Object opened by the enclosing block, if any
    pub focus: Option<Focus>,
}

/// Parse state for one IOS configuration: the tree plus the standard ACL
/// blocks not yet written to it.
#[derive(Debug, Default)]
pub struct IosConfig {
    tree: ConfigTree,
    std_acls: StdAclBuffer,
}

impl IosConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tree(&self) -> &ConfigTree {
        &self.tree
    }

    pub fn root_mut(&mut self) -> &mut Map {
        self.tree.root_mut()
    }

    /// Consume the state, returning the tree.
    ///
    /// Standard ACL rules still buffered are lost; the parser flushes them
    /// before this is reached.
    pub fn into_tree(self) -> ConfigTree {
        self.tree
    }

    /// Add a rule to a standard ACL, writing out the open block first if
    /// the rule overlaps it.
    pub fn add_std_rule(&mut self, id: &str, rule: &str) -> Result<()> {
        let rule = StdRule::parse(rule)?;

        if let Some(closed) = self.std_acls.add(id, rule) {
            self.store_std_rules(id, closed)?;
        }
        Ok(())
    }

    fn store_std_rules(&mut self, id: &str, rules: Vec<String>) -> Result<()> {
        let acls = path_entry(self.tree.root_mut(), &["acl4-std"])?;
        list_entry(acls, id)?.extend(rules);
        Ok(())
    }
}

impl ParseTarget for IosConfig {
    type Params = IosParams;
    type Section = Value;

    fn section_mut(&mut self, params: &IosParams) -> Option<&mut Value> {
        let focus = params.focus.as_ref()?;
        self.tree
            .root_mut()
            .get_mut(focus.section())?
            .as_map_mut()?
            .get_mut(&focus.id())
    }

    fn finish(&mut self) -> Result<()> {
        for (id, rules) in self.std_acls.flush_all() {
            self.store_std_rules(&id, rules)?;
        }
        Ok(())
    }
}

/// Parser for Cisco IOS configuration text.
///
/// Holds only the command table, so one instance can parse any number of
/// files; every parse builds its own tree.
#[derive(Debug)]
pub struct IosParser {
    parser: ContextParser<IosConfig>,
}

impl IosParser {
    /// Build a parser with the full IOS command table.
    pub fn new() -> Result<Self> {
        let mut parser = ContextParser::named("ios");
        commands::register_all(&mut parser)?;
        Ok(Self { parser })
    }

    /// Add a command after the built-in ones for `context`.
    pub fn register(
        &mut self,
        context: &str,
        pattern: &str,
        action: Option<Action<IosConfig>>,
        enter_context: Option<&str>,
    ) -> Result<&mut Self> {
        self.parser.register(context, pattern, action, enter_context)?;
        Ok(self)
    }

    /// The underlying generic parser.
    pub fn parser(&self) -> &ContextParser<IosConfig> {
        &self.parser
    }

    /// Parse configuration text into a tree.
    pub fn parse(&self, text: &str) -> Result<ConfigTree> {
        self.parse_lines(text.lines()).map(|(tree, _)| tree)
    }

    /// Parse a sequence of lines, also returning line counts.
    pub fn parse_lines<I, S>(&self, lines: I) -> Result<(ConfigTree, ParseStats)>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut config = IosConfig::new();
        let stats = self.parser.parse_into(&mut config, lines)?;
        let tree = config.into_tree();

        debug!(
            sections = tree.root().len(),
            ignored = stats.ignored,
            "IOS configuration parsed"
        );

        Ok((tree, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn parse(text: &str) -> ConfigTree {
        IosParser::new().unwrap().parse(text).unwrap()
    }

    fn list(tree: &ConfigTree, section: &str, id: &str) -> Vec<String> {
        tree.object(section, id)
            .and_then(Value::as_list)
            .map(<[String]>::to_vec)
            .unwrap_or_default()
    }

    #[test]
    fn test_interface_and_std_acl() {
        let tree = parse(
            "\
interface GigabitEthernet0/1
 description uplink
 ip address 10.0.0.1 255.255.255.0
access-list 10 permit 10.0.0.0 0.0.0.255
access-list 10 deny 10.0.0.5
",
        );

        assert_eq!(
            tree.attribute("interfaces", "Gi0/1", "description"),
            Some(&Value::Str("uplink".into()))
        );
        assert_eq!(
            tree.attribute("interfaces", "Gi0/1", "ip-address")
                .and_then(Value::as_tuple),
            Some(&["10.0.0.1".to_string(), "255.255.255.0".to_string()][..])
        );
        assert_eq!(
            list(&tree, "acl4-std", "10"),
            vec!["permit 10.0.0.0 0.0.0.255", "deny 10.0.0.5"]
        );
    }

    #[test]
    fn test_focus_paths() {
        assert_eq!(Focus::Vlan(10).to_string(), "vlans[10]");
        assert_eq!(Focus::Acl6("V6-IN".into()).section(), "acl6");
    }

    #[test]
    fn test_section_mut_follows_focus() {
        let mut config = IosConfig::new();
        path_entry(config.root_mut(), &["interfaces", "Gi0/1"]).unwrap();

        let params = IosParams {
            focus: Some(Focus::Interface("Gi0/1".into())),
        };
        assert!(matches!(config.section_mut(&params), Some(Value::Map(_))));
        assert!(config.section_mut(&IosParams::default()).is_none());

        let missing = IosParams {
            focus: Some(Focus::Vlan(5)),
        };
        assert!(config.section_mut(&missing).is_none());
    }

    #[test]
    fn test_pending_rules_flushed_on_finish() {
        let mut config = IosConfig::new();
        config.add_std_rule("5", "permit host 192.168.1.1").unwrap();
        config.add_std_rule("5", "permit 10.1.1.1").unwrap();
        assert!(config.tree().get("acl4-std").is_none());

        config.finish().unwrap();
        assert_eq!(
            list(config.tree(), "acl4-std", "5"),
            vec!["permit 10.1.1.1", "permit 192.168.1.1"]
        );
    }

    #[test]
    fn test_bad_std_rule_aborts_with_line() {
        let err = IosParser::new()
            .unwrap()
            .parse("hostname r1\naccess-list 10 permit tcp any any\n")
            .unwrap_err();

        assert_eq!(err.line_no(), Some(2));
        assert!(matches!(err.root(), Error::AclRule { kind: "IPv4 standard", .. }));
    }

    #[test]
    fn test_register_extends_grammar() {
        fn cmd_banner(
            _: &crate::parser::Groups<'_>,
            scope: &mut crate::parser::Scope<'_, IosConfig>,
        ) -> Result<()> {
            scope
                .target()
                .root_mut()
                .insert("banner".into(), Value::Str("set".into()));
            Ok(())
        }

        let mut parser = IosParser::new().unwrap();
        parser
            .register(crate::parser::ROOT_CONTEXT, r"banner .+", Some(cmd_banner), None)
            .unwrap();

        let tree = parser.parse("banner motd ^C hello ^C\n").unwrap();
        assert_eq!(tree.get("banner"), Some(&Value::Str("set".into())));
    }
}
