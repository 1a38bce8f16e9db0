//! IOS command table and the actions that build the tree.
//!
//! Commands are tried in table order within a context, so a pattern that
//! is a special case of another must come first.

use super::acl::{normalize_ext_rule, normalize_v6_rule};
use super::normalize::{expand_set, interface_name, vlan_tag};
use super::{
    Focus, IosConfig, ACL4_EXT_CONTEXT, ACL4_STD_CONTEXT, ACL6_CONTEXT, INTERFACE_CONTEXT,
    VLAN_CONTEXT,
};
use crate::error::{Error, Result};
use crate::parser::{Action, ContextParser, Groups, Scope, ROOT_CONTEXT};
use crate::tree::{list_entry, map_entry, num_set_entry, path_entry, set_entry, Map, Value};
use tracing::debug;

type IosScope<'a> = Scope<'a, IosConfig>;

/// One row of the command table.
struct CommandSpec {
    context: &'static str,
    pattern: &'static str,
    action: Option<Action<IosConfig>>,
    enter: Option<&'static str>,
}

const fn cmd(
    context: &'static str,
    pattern: &'static str,
    action: Action<IosConfig>,
) -> CommandSpec {
    CommandSpec {
        context,
        pattern,
        action: Some(action),
        enter: None,
    }
}

const fn block(
    pattern: &'static str,
    action: Action<IosConfig>,
    enter: &'static str,
) -> CommandSpec {
    CommandSpec {
        context: ROOT_CONTEXT,
        pattern,
        action: Some(action),
        enter: Some(enter),
    }
}

const RULE_PATTERN: &str = r"(?P<rule>(?:permit|deny) +.+)";

static COMMANDS: &[CommandSpec] = &[
    // System
    CommandSpec {
        context: ROOT_CONTEXT,
        pattern: r"!.*",
        action: None,
        enter: None,
    },
    cmd(ROOT_CONTEXT, r"hostname (?P<hostname>\S+)", cmd_hostname),
    // VLANs and spanning tree
    block(r"vlan (?P<tag>\d+)", cmd_vlan, VLAN_CONTEXT),
    cmd(VLAN_CONTEXT, r"name (?P<name>\S+)", cmd_vlan_name),
    cmd(
        ROOT_CONTEXT,
        r"no spanning-tree vlan (?P<tags>[-0-9,]+)",
        cmd_no_stp,
    ),
    cmd(
        ROOT_CONTEXT,
        r"spanning-tree vlan (?P<tags>[-0-9,]+) priority (?P<priority>\d+)",
        cmd_stp_priority,
    ),
    // Interfaces
    block(
        r"interface (?P<name>\S+(?: [0-9][0-9/.:]*)?)",
        cmd_interface,
        INTERFACE_CONTEXT,
    ),
    cmd(INTERFACE_CONTEXT, r"(?P<no>no )?cdp enable", cmd_int_cdp),
    cmd(
        INTERFACE_CONTEXT,
        r"channel-group (?P<id>\d+)(?: (?P<mode>.+))?",
        cmd_int_channel_group,
    ),
    cmd(
        INTERFACE_CONTEXT,
        r"description (?P<description>.+)",
        cmd_int_description,
    ),
    cmd(
        INTERFACE_CONTEXT,
        r"encapsulation (?P<encap>dot1q \d+(?: native)?)",
        cmd_int_encapsulation,
    ),
    cmd(
        INTERFACE_CONTEXT,
        r"ip helper-address (?P<helper_addr>(?:global )?\S+)",
        cmd_int_helper_address,
    ),
    cmd(
        INTERFACE_CONTEXT,
        r"ip access-group (?P<acl>\S+) (?P<direction>in|out)",
        cmd_int_access_group,
    ),
    cmd(
        INTERFACE_CONTEXT,
        r"ip address (?P<addr>\S+) (?P<netmask>\S+) secondary",
        cmd_int_ip_address_secondary,
    ),
    cmd(
        INTERFACE_CONTEXT,
        r"ip address (?P<addr>\S+) (?P<netmask>\S+)",
        cmd_int_ip_address,
    ),
    cmd(
        INTERFACE_CONTEXT,
        r"ipv6 address (?P<addr>\S+)",
        cmd_int_ipv6_address,
    ),
    cmd(
        INTERFACE_CONTEXT,
        r"vrf forwarding (?P<vrf>\S+)",
        cmd_int_vrf,
    ),
    cmd(
        INTERFACE_CONTEXT,
        r"service-policy (?P<policy>.+)",
        cmd_int_service_policy,
    ),
    cmd(INTERFACE_CONTEXT, r"(?P<no>no )?shutdown", cmd_int_shutdown),
    cmd(
        INTERFACE_CONTEXT,
        r"switchport trunk native vlan (?P<vlan>\d+)",
        cmd_int_trunk_native,
    ),
    cmd(
        INTERFACE_CONTEXT,
        r"switchport trunk allowed vlan (?:add )?(?P<vlans>[0-9,-]+)",
        cmd_int_trunk_allowed,
    ),
    cmd(
        INTERFACE_CONTEXT,
        r"xconnect (?P<remote>[0-9.]+ \d+ .+)",
        cmd_int_xconnect,
    ),
    // Static routes
    cmd(ROOT_CONTEXT, r"ip route (?P<route>.+)", cmd_ip_route),
    cmd(ROOT_CONTEXT, r"ipv6 route (?P<route>.+)", cmd_ipv6_route),
    // IPv4 standard access lists
    cmd(
        ROOT_CONTEXT,
        r"access-list (?P<num>\d{1,2}|1[3-9]\d{2}) (?P<rule>.+)",
        cmd_acl4_std_numbered,
    ),
    block(
        r"ip access-list standard (?P<name>.+)",
        cmd_acl4_std_named,
        ACL4_STD_CONTEXT,
    ),
    cmd(ACL4_STD_CONTEXT, RULE_PATTERN, cmd_acl4_std_rule),
    // IPv4 extended access lists
    cmd(
        ROOT_CONTEXT,
        r"access-list (?P<num>1\d{2}|2[0-6]\d{2}) (?P<rule>.+)",
        cmd_acl4_ext_numbered,
    ),
    block(
        r"ip access-list extended (?P<name>.+)",
        cmd_acl4_ext_named,
        ACL4_EXT_CONTEXT,
    ),
    cmd(ACL4_EXT_CONTEXT, RULE_PATTERN, cmd_acl4_ext_rule),
    // IPv6 access lists
    block(
        r"ipv6 access-list (?P<name>.+)",
        cmd_acl6_named,
        ACL6_CONTEXT,
    ),
    cmd(ACL6_CONTEXT, RULE_PATTERN, cmd_acl6_rule),
    // Prefix lists
    cmd(
        ROOT_CONTEXT,
        r"ip prefix-list (?P<list>\S+) (?:seq \d+ )?(?P<rule>.+)",
        cmd_pfx4,
    ),
    cmd(
        ROOT_CONTEXT,
        r"ipv6 prefix-list (?P<list>\S+) (?:seq \d+ )?(?P<rule>.+)",
        cmd_pfx6,
    ),
];

/// Register the whole IOS command table with `parser`.
pub fn register_all(parser: &mut ContextParser<IosConfig>) -> Result<()> {
    for spec in COMMANDS {
        parser.register(spec.context, spec.pattern, spec.action, spec.enter)?;
    }
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Attribute map of the object the enclosing block opened.
fn focused_map<'a>(scope: &'a mut IosScope<'_>, what: &'static str) -> Result<&'a mut Map> {
    scope
        .section()
        .and_then(Value::as_map_mut)
        .ok_or(Error::MissingFocus(what))
}

/// Rule list of the access list the enclosing block opened.
fn focused_list<'a>(
    scope: &'a mut IosScope<'_>,
    what: &'static str,
) -> Result<&'a mut Vec<String>> {
    scope
        .section()
        .and_then(Value::as_list_mut)
        .ok_or(Error::MissingFocus(what))
}

/// Leave a line out of the tree, as if it had not matched.
fn skip_line(groups: &Groups<'_>, error: Error) -> Result<()> {
    debug!(line = groups.text(), %error, "skipping line");
    Ok(())
}

fn set_str(map: &mut Map, key: &str, value: impl Into<String>) {
    map.insert(key.to_string(), Value::Str(value.into()));
}

/// Add or remove `option` in the `options` set, depending on a `no` prefix.
fn toggle_option(groups: &Groups<'_>, map: &mut Map, option: &str) -> Result<()> {
    let options = set_entry(map, "options")?;
    if groups.has("no") {
        options.remove(option);
    } else {
        options.insert(option.to_string());
    }
    Ok(())
}

/// Start a named access list: create its (possibly empty) list and point
/// the block at it.
fn open_acl(scope: &mut IosScope<'_>, focus: Focus) -> Result<()> {
    let section = path_entry(scope.target().root_mut(), &[focus.section()])?;
    list_entry(section, &focus.id())?;
    scope.params_mut().focus = Some(focus);
    Ok(())
}

fn append_rule(scope: &mut IosScope<'_>, section: &str, id: &str, rule: String) -> Result<()> {
    let lists = path_entry(scope.target().root_mut(), &[section])?;
    list_entry(lists, id)?.push(rule);
    Ok(())
}

// ============================================================================
// System
// ============================================================================

fn cmd_hostname(groups: &Groups<'_>, scope: &mut IosScope<'_>) -> Result<()> {
    set_str(scope.target().root_mut(), "hostname", groups.require("hostname")?);
    Ok(())
}

// ============================================================================
// VLANs and Spanning Tree
// ============================================================================

fn cmd_vlan(groups: &Groups<'_>, scope: &mut IosScope<'_>) -> Result<()> {
    let tag = match vlan_tag(groups.require("tag")?) {
        Ok(tag) => tag,
        Err(e) => return skip_line(groups, e),
    };

    let vlan = path_entry(scope.target().root_mut(), &["vlans", &tag.to_string()])?;
    set_entry(vlan, "options")?.insert("exists".to_string());

    scope.params_mut().focus = Some(Focus::Vlan(tag));
    Ok(())
}

fn cmd_vlan_name(groups: &Groups<'_>, scope: &mut IosScope<'_>) -> Result<()> {
    let name = groups.require("name")?;
    // The block was skipped if its tag was invalid
    if let Some(vlan) = scope.section().and_then(Value::as_map_mut) {
        set_str(vlan, "name", name);
    }
    Ok(())
}

fn cmd_no_stp(groups: &Groups<'_>, scope: &mut IosScope<'_>) -> Result<()> {
    let tags = match expand_set(groups.require("tags")?) {
        Ok(tags) => tags,
        Err(e) => return skip_line(groups, e),
    };
    num_set_entry(scope.target().root_mut(), "no-stp")?.extend(tags);
    Ok(())
}

fn cmd_stp_priority(groups: &Groups<'_>, scope: &mut IosScope<'_>) -> Result<()> {
    let tags = match expand_set(groups.require("tags")?) {
        Ok(tags) => tags,
        Err(e) => return skip_line(groups, e),
    };
    let priority = groups.require("priority")?;

    let priorities = map_entry(scope.target().root_mut(), "stp-priority")?;
    for tag in tags {
        set_str(priorities, &tag.to_string(), priority);
    }
    Ok(())
}

// ============================================================================
// Interfaces
// ============================================================================

fn cmd_interface(groups: &Groups<'_>, scope: &mut IosScope<'_>) -> Result<()> {
    let name = interface_name(groups.require("name")?);
    path_entry(scope.target().root_mut(), &["interfaces", &name])?;
    scope.params_mut().focus = Some(Focus::Interface(name));
    Ok(())
}

fn cmd_int_cdp(groups: &Groups<'_>, scope: &mut IosScope<'_>) -> Result<()> {
    toggle_option(groups, focused_map(scope, "interface")?, "cdp")
}

fn cmd_int_channel_group(groups: &Groups<'_>, scope: &mut IosScope<'_>) -> Result<()> {
    let mut chgrp = vec![groups.require("id")?.to_string()];
    chgrp.extend(groups.get("mode").map(String::from));

    focused_map(scope, "interface")?.insert("chgrp".to_string(), Value::Tuple(chgrp));
    Ok(())
}

fn cmd_int_description(groups: &Groups<'_>, scope: &mut IosScope<'_>) -> Result<()> {
    let description = groups.require("description")?;
    set_str(focused_map(scope, "interface")?, "description", description);
    Ok(())
}

fn cmd_int_encapsulation(groups: &Groups<'_>, scope: &mut IosScope<'_>) -> Result<()> {
    // IOS writes dot1Q
    let encap = groups.require("encap")?.to_lowercase();
    set_str(focused_map(scope, "interface")?, "encap", encap);
    Ok(())
}

fn cmd_int_helper_address(groups: &Groups<'_>, scope: &mut IosScope<'_>) -> Result<()> {
    let helper = groups.require("helper_addr")?.to_string();
    set_entry(focused_map(scope, "interface")?, "ip-helper-addr")?.insert(helper);
    Ok(())
}

fn cmd_int_access_group(groups: &Groups<'_>, scope: &mut IosScope<'_>) -> Result<()> {
    let acl = groups.require("acl")?;
    let direction = groups.require("direction")?.to_lowercase();

    let access_groups = map_entry(focused_map(scope, "interface")?, "ip-access-group")?;
    set_str(access_groups, &direction, acl);
    Ok(())
}

fn cmd_int_ip_address(groups: &Groups<'_>, scope: &mut IosScope<'_>) -> Result<()> {
    let address = vec![
        groups.require("addr")?.to_string(),
        groups.require("netmask")?.to_string(),
    ];
    focused_map(scope, "interface")?.insert("ip-address".to_string(), Value::Tuple(address));
    Ok(())
}

fn cmd_int_ip_address_secondary(groups: &Groups<'_>, scope: &mut IosScope<'_>) -> Result<()> {
    let address = format!("{} {}", groups.require("addr")?, groups.require("netmask")?);
    set_entry(focused_map(scope, "interface")?, "ip-address-secondary")?.insert(address);
    Ok(())
}

fn cmd_int_ipv6_address(groups: &Groups<'_>, scope: &mut IosScope<'_>) -> Result<()> {
    let address = groups.require("addr")?.to_lowercase();
    set_entry(focused_map(scope, "interface")?, "ipv6-address")?.insert(address);
    Ok(())
}

fn cmd_int_vrf(groups: &Groups<'_>, scope: &mut IosScope<'_>) -> Result<()> {
    let vrf = groups.require("vrf")?;
    set_str(focused_map(scope, "interface")?, "vrf-forwarding", vrf);
    Ok(())
}

fn cmd_int_service_policy(groups: &Groups<'_>, scope: &mut IosScope<'_>) -> Result<()> {
    let policy = groups.require("policy")?.to_string();
    set_entry(focused_map(scope, "interface")?, "service-policy")?.insert(policy);
    Ok(())
}

fn cmd_int_shutdown(groups: &Groups<'_>, scope: &mut IosScope<'_>) -> Result<()> {
    toggle_option(groups, focused_map(scope, "interface")?, "shutdown")
}

fn cmd_int_trunk_native(groups: &Groups<'_>, scope: &mut IosScope<'_>) -> Result<()> {
    let vlan = groups.require("vlan")?;
    set_str(focused_map(scope, "interface")?, "swport-trk-ntv", vlan);
    Ok(())
}

fn cmd_int_trunk_allowed(groups: &Groups<'_>, scope: &mut IosScope<'_>) -> Result<()> {
    let vlans = match expand_set(groups.require("vlans")?) {
        Ok(vlans) => vlans,
        Err(e) => return skip_line(groups, e),
    };
    num_set_entry(focused_map(scope, "interface")?, "swport-trk-alw")?.extend(vlans);
    Ok(())
}

fn cmd_int_xconnect(groups: &Groups<'_>, scope: &mut IosScope<'_>) -> Result<()> {
    let remote = groups.require("remote")?;
    set_str(focused_map(scope, "interface")?, "xconnect", remote);
    Ok(())
}

// ============================================================================
// Static Routes
// ============================================================================

fn cmd_ip_route(groups: &Groups<'_>, scope: &mut IosScope<'_>) -> Result<()> {
    let route = groups.require("route")?.to_string();
    set_entry(scope.target().root_mut(), "route4")?.insert(route);
    Ok(())
}

fn cmd_ipv6_route(groups: &Groups<'_>, scope: &mut IosScope<'_>) -> Result<()> {
    let route = groups.require("route")?.to_lowercase();
    set_entry(scope.target().root_mut(), "route6")?.insert(route);
    Ok(())
}

// ============================================================================
// Access Lists
// ============================================================================

fn cmd_acl4_std_numbered(groups: &Groups<'_>, scope: &mut IosScope<'_>) -> Result<()> {
    let num = groups.require("num")?;
    let rule = groups.require("rule")?;
    scope.target().add_std_rule(num, rule)
}

fn cmd_acl4_std_named(groups: &Groups<'_>, scope: &mut IosScope<'_>) -> Result<()> {
    open_acl(scope, Focus::Acl4Std(groups.require("name")?.to_string()))
}

fn cmd_acl4_std_rule(groups: &Groups<'_>, scope: &mut IosScope<'_>) -> Result<()> {
    let Some(Focus::Acl4Std(name)) = scope.params().focus.clone() else {
        return Err(Error::MissingFocus("standard access-list"));
    };
    scope.target().add_std_rule(&name, groups.require("rule")?)
}

fn cmd_acl4_ext_numbered(groups: &Groups<'_>, scope: &mut IosScope<'_>) -> Result<()> {
    let num = groups.require("num")?;
    let rule = normalize_ext_rule(groups.require("rule")?)?;
    append_rule(scope, "acl4-ext", num, rule)
}

fn cmd_acl4_ext_named(groups: &Groups<'_>, scope: &mut IosScope<'_>) -> Result<()> {
    open_acl(scope, Focus::Acl4Ext(groups.require("name")?.to_string()))
}

fn cmd_acl4_ext_rule(groups: &Groups<'_>, scope: &mut IosScope<'_>) -> Result<()> {
    let rule = normalize_ext_rule(groups.require("rule")?)?;
    focused_list(scope, "extended access-list")?.push(rule);
    Ok(())
}

fn cmd_acl6_named(groups: &Groups<'_>, scope: &mut IosScope<'_>) -> Result<()> {
    open_acl(scope, Focus::Acl6(groups.require("name")?.to_string()))
}

fn cmd_acl6_rule(groups: &Groups<'_>, scope: &mut IosScope<'_>) -> Result<()> {
    let rule = normalize_v6_rule(groups.require("rule")?)?;
    focused_list(scope, "IPv6 access-list")?.push(rule);
    Ok(())
}

// ============================================================================
// Prefix Lists
// ============================================================================

fn cmd_pfx4(groups: &Groups<'_>, scope: &mut IosScope<'_>) -> Result<()> {
    let list = groups.require("list")?;
    let rule = groups.require("rule")?.to_string();
    append_rule(scope, "pfx4", list, rule)
}

fn cmd_pfx6(groups: &Groups<'_>, scope: &mut IosScope<'_>) -> Result<()> {
    let list = groups.require("list")?;
    let rule = groups.require("rule")?.to_lowercase();
    append_rule(scope, "pfx6", list, rule)
}
