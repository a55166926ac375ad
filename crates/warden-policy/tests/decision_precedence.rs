// decision_precedence.rs — End-to-end scenarios across a fully wired engine.
//
// These tests assemble the engine the way the host bootstrap would —
// template policy, dynamic grants, plugin policies, secured files, data
// path, ambient system policy — and then drive whole request flows
// through it:
//
//   1. A plugin granted read on its own data via its plugin policy, with
//      a data-path fast set covering the same tree: the grant must hold
//      from either source, and anything ungranted must deny.
//   2. A secured file allow-listed to one origin: the listed origin gets
//      in, every other origin is shut out even when its plugin policy or
//      the ambient policy would grant unrestricted file access.
//
// VERIFY:
//   - Every decision is reproducible across repeated queries.
//   - Denials are plain `Ok(false)`, never errors.

use std::collections::HashMap;
use std::sync::Arc;

use warden_permission::{
    ExecutionContext, FileAction, FileActionSet, Origin, Permission, PermissionSet,
};
use warden_policy::{DenyAll, EngineConfig, Policy, PolicyEngine, StaticPolicy};

fn read(target: &str) -> Permission {
    Permission::file(target, FileActionSet::single(FileAction::Read)).unwrap()
}

fn write(target: &str) -> Permission {
    Permission::file(target, FileActionSet::single(FileAction::Write)).unwrap()
}

struct AllowAll;

impl Policy for AllowAll {
    fn implies(&self, _: &ExecutionContext, _: &Permission) -> bool {
        true
    }
}

#[test]
fn plugin_data_access_grants_and_everything_else_denies() {
    // Origin U's plugin policy grants read on /data/x; the data-path set
    // covers /data/**; the union sources deny everything.
    let mut plugins: HashMap<Origin, Arc<dyn Policy>> = HashMap::new();
    plugins.insert(
        Origin::new("plugin://u"),
        Arc::new(StaticPolicy::granting_all_origins(PermissionSet::from_iter(
            [read("/data/x")],
        ))),
    );

    let mut config = EngineConfig::new(Arc::new(DenyAll), Arc::new(DenyAll));
    config.plugins = plugins;
    config.data_path_permissions = vec![Permission::file("/data/**", FileActionSet::ALL).unwrap()];
    let engine = PolicyEngine::new(config).unwrap();

    let u = ExecutionContext::with_origin("plugin://u");

    // Granted via the plugin short-circuit or the data-path fast path;
    // either source suffices, and the answer is stable.
    for _ in 0..3 {
        assert!(engine.implies(&u, &read("/data/x")).unwrap());
    }

    // Nothing grants writes outside the data tree.
    assert!(!engine.implies(&u, &write("/etc/passwd")).unwrap());

    // A context with no origin gets nothing, data path or not.
    assert!(!engine
        .implies(&ExecutionContext::unattributed(), &read("/data/x"))
        .unwrap());
}

#[test]
fn secured_file_allow_list_beats_every_other_grant_source() {
    // /secrets/key.pem is allow-listed to origin A only. Origin B has a
    // plugin policy granting unrestricted file access, and the ambient
    // system policy grants every file permission — neither may open the
    // secured file. (The ambient policy must not grant `All`: that is the
    // privileged platform-internal bypass, unreachable by extensions.)
    let mut plugins: HashMap<Origin, Arc<dyn Policy>> = HashMap::new();
    plugins.insert(Origin::new("plugin://b"), Arc::new(AllowAll));

    let ambient = StaticPolicy::granting_all_origins(PermissionSet::from_iter([
        Permission::file("/**", FileActionSet::ALL).unwrap(),
    ]));
    let mut config = EngineConfig::new(Arc::new(DenyAll), Arc::new(ambient));
    config.plugins = plugins;
    config.secured_files.insert(
        "/secrets/key.pem".to_string(),
        [Origin::new("plugin://a")].into_iter().collect(),
    );
    // Keep the ambient bad-default filtering on, as production does; it
    // does not interfere with file decisions.
    let engine = PolicyEngine::new(config).unwrap();

    let a = ExecutionContext::with_origin("plugin://a");
    let b = ExecutionContext::with_origin("plugin://b");
    let key = read("/secrets/key.pem");

    assert!(engine.implies(&a, &key).unwrap());
    assert!(!engine.implies(&b, &key).unwrap());

    // Outside the secured path, B's permissive plugin policy applies.
    assert!(engine.implies(&b, &read("/var/anything")).unwrap());
    // And A, with no plugin policy, still gets the permissive ambient
    // policy through the union.
    assert!(engine.implies(&a, &read("/var/anything")).unwrap());
}
