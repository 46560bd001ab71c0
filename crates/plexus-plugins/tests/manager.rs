//! End-to-end behavior of `PluginManager`.

use std::sync::Arc;

use serde_json::{Value, json};

use plexus_plugins::{
    ExtensionDescriptor, ExtensionHandle, ExtensionPointId, Plugin, PluginError, PluginId,
    PluginManager,
};
use plexus_test::{
    CountingFactory, EXTENSION_POINT_A, EXTENSION_POINT_B, EchoFactory, FIXTURE_MODULE_URLS,
    FailingFactory, Farewell, Greeter, NodeModulesBuilder, StaticRepository, malformed_export,
    plugin_a, plugin_b,
};

fn ep_a() -> ExtensionPointId {
    ExtensionPointId::from(EXTENSION_POINT_A)
}

fn ep_b() -> ExtensionPointId {
    ExtensionPointId::from(EXTENSION_POINT_B)
}

fn repository() -> StaticRepository {
    StaticRepository::new()
        .with_plugin("PluginA", plugin_a())
        .with_plugin("PluginB", plugin_b())
}

fn manager_with(repo: &StaticRepository, points: &[ExtensionPointId]) -> PluginManager {
    let mut manager = PluginManager::new(Arc::new(repo.clone()));
    for point in points {
        manager.register_extension_point(point.clone()).unwrap();
    }
    manager
}

#[test]
fn extension_points_register_once() {
    let mut manager = manager_with(&repository(), &[]);
    assert_eq!(manager.registered_extension_points().count(), 0);

    manager.register_extension_point(ep_a()).unwrap();
    assert!(matches!(
        manager.register_extension_point(ep_a()),
        Err(PluginError::ExtensionPointAlreadyRegistered(_))
    ));
    manager.register_extension_point(ep_b()).unwrap();

    assert!(matches!(
        manager.register_extension_point("".into()),
        Err(PluginError::InvalidId(_))
    ));

    let declared: Vec<_> = manager.registered_extension_points().cloned().collect();
    assert_eq!(declared, vec![ep_a(), ep_b()]);
}

#[tokio::test]
async fn repeated_discovery_is_idempotent() {
    let repo = repository();
    let mut manager = manager_with(&repo, &[ep_a()]);

    assert_eq!(manager.register_plugins_by_module_name("PluginA", None).await.unwrap(), 1);
    assert_eq!(manager.register_plugins_by_module_name("PluginA", None).await.unwrap(), 0);
    assert_eq!(manager.registered_plugins().count(), 1);
    assert_eq!(manager.extensions(&ep_a()).len(), 1);
    assert_eq!(repo.query_count(), 2);
}

#[tokio::test]
async fn direct_duplicate_registration_fails() {
    let mut manager = manager_with(&repository(), &[ep_a()]);
    let id = PluginId::from_static("PluginA");

    manager.register_plugin(id.clone(), plugin_a()).unwrap();
    assert!(matches!(
        manager.register_plugin(id.clone(), plugin_a()),
        Err(PluginError::AlreadyRegistered(_))
    ));
    assert_eq!(manager.extensions(&ep_a()).len(), 1);
    assert!(manager.registered_plugin(&id).is_ok());
}

#[tokio::test]
async fn extensions_join_across_plugins() {
    let mut manager = manager_with(&repository(), &[ep_a(), ep_b()]);

    assert_eq!(manager.register_plugins_by_module_name("PluginA", None).await.unwrap(), 1);
    assert_eq!(manager.register_plugins_by_module_name("PluginB", None).await.unwrap(), 1);

    let a = manager.extensions(&ep_a());
    assert_eq!(a.len(), 2);
    assert_eq!(a[0].plugin_id.as_str(), "PluginA");
    assert_eq!(a[0].extension_data, Some(json!("foo")));
    assert_eq!(a[0].plugin_data, Some(json!("bar")));
    assert_eq!(a[1].plugin_id.as_str(), "PluginB");
    assert_eq!(a[1].plugin_data, None);
    assert_ne!(a[0].extension_handle, a[1].extension_handle);

    assert_eq!(manager.extensions(&ep_b()).len(), 1);
}

#[tokio::test]
async fn undeclared_extension_points_get_no_extensions() {
    let mut manager = manager_with(&repository(), &[ep_a()]);

    assert_eq!(manager.register_plugins_by_module_name("PluginB", None).await.unwrap(), 1);
    assert_eq!(manager.extensions(&ep_a()).len(), 1);
    assert!(manager.extensions(&ep_b()).is_empty());

    // Declaring the point later does not back-fill plugins already registered.
    manager.register_extension_point(ep_b()).unwrap();
    assert!(manager.extensions(&ep_b()).is_empty());
}

#[tokio::test]
async fn discovery_by_extension_point_filters_plugins() {
    let mut manager = manager_with(&repository(), &[ep_a(), ep_b()]);

    assert_eq!(manager.register_plugins_by_extension_point(&ep_b()).await.unwrap(), 1);
    let ids: Vec<_> = manager
        .registered_plugins()
        .map(|(id, _)| id.as_str().to_owned())
        .collect();
    assert_eq!(ids, vec!["PluginB".to_owned()]);
}

#[tokio::test]
async fn instantiate_creates_fixture_extensions() {
    let mut manager = manager_with(&repository(), &[ep_a(), ep_b()]);
    manager.register_all_plugins().await.unwrap();

    let info = &manager.extensions(&ep_a())[0];
    let instance = manager.instantiate(&info.extension_handle, None).await.unwrap();
    let greeter = instance.downcast_ref::<Greeter>().unwrap();
    assert_eq!(greeter.say_hello(), "hello");

    let info = &manager.extensions(&ep_b())[0];
    let instance = manager.instantiate(&info.extension_handle, None).await.unwrap();
    assert_eq!(instance.downcast_ref::<Farewell>().unwrap().say_goodbye(), "goodbye");
}

#[tokio::test]
async fn instantiate_forwards_host_data() {
    let mut manager = manager_with(&StaticRepository::new(), &[ep_a()]);
    let plugin = Plugin::new(vec![ExtensionDescriptor::new(ep_a(), Arc::new(EchoFactory))]);
    manager
        .register_plugin(PluginId::from_static("echo"), plugin)
        .unwrap();

    let handle = manager.extensions(&ep_a())[0].extension_handle.clone();
    let host_data = json!({"theme": "dark"});
    let instance = manager
        .instantiate(&handle, Some(host_data.clone()))
        .await
        .unwrap();
    let echoed = instance.downcast_ref::<Option<Value>>().unwrap();
    assert_eq!(echoed.as_ref(), Some(&host_data));
}

#[tokio::test]
async fn instantiate_unknown_handle_never_calls_a_factory() {
    let counting = CountingFactory::new();
    let mut manager = manager_with(&StaticRepository::new(), &[ep_a()]);
    let plugin = Plugin::new(vec![ExtensionDescriptor::new(ep_a(), Arc::new(counting.clone()))]);
    manager
        .register_plugin(PluginId::from_static("counted"), plugin)
        .unwrap();

    let result = manager
        .instantiate(&ExtensionHandle::from_raw("foo"), None)
        .await;
    assert!(matches!(result, Err(PluginError::ExtensionNotFound(_))));
    assert_eq!(counting.calls(), 0);

    let handle = manager.extensions(&ep_a())[0].extension_handle.clone();
    manager.instantiate(&handle, None).await.unwrap();
    manager.instantiate(&handle, None).await.unwrap();
    assert_eq!(counting.calls(), 2);
}

#[tokio::test]
async fn instantiate_returns_factory_errors() {
    let mut manager = manager_with(&StaticRepository::new(), &[ep_a()]);
    let plugin = Plugin::new(vec![ExtensionDescriptor::new(
        ep_a(),
        Arc::new(FailingFactory::new(ep_a())),
    )]);
    manager
        .register_plugin(PluginId::from_static("refuses"), plugin)
        .unwrap();

    let handle = manager.extensions(&ep_a())[0].extension_handle.clone();
    let result = manager.instantiate(&handle, None).await;
    assert!(matches!(
        result,
        Err(PluginError::ExtensionCreateFailed { extension_point_id, .. })
            if extension_point_id == ep_a()
    ));
}

#[tokio::test]
async fn url_manager_keeps_configured_urls() {
    let urls = ["https://CDN.example.com/widgets", "https://cdn.example.com"];
    let loader = urls
        .iter()
        .fold(plexus_plugins::StaticModuleLoader::new(), |loader, url| {
            loader.with_module(*url, plexus_plugins::ModuleExport::plugin(plugin_a()))
        });
    let mut manager = PluginManager::from_urls(urls, Arc::new(loader)).unwrap();
    manager.register_extension_point(ep_a()).unwrap();

    assert_eq!(manager.register_all_plugins().await.unwrap(), 2);
    for url in urls {
        assert!(manager.registered_plugin(&PluginId::from_static(url)).is_ok());
    }
    assert_eq!(
        manager.register_plugins_by_module_name("widgets", None).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn node_modules_tree_end_to_end() {
    let tree = NodeModulesBuilder::new()
        .with_fixture_tree()
        .with_export("@fooscope/broken", malformed_export());
    let mut manager = tree.manager();
    manager.register_extension_point(ep_a()).unwrap();

    assert_eq!(manager.register_plugins_by_module_scope("fooscope").await.unwrap(), 4);
    assert_eq!(
        manager
            .register_plugins_by_module_scope_and_extension_point("@barscope", &ep_a())
            .await
            .unwrap(),
        4
    );
    assert_eq!(manager.register_all_plugins().await.unwrap(), 2);
    assert_eq!(manager.register_all_plugins().await.unwrap(), 0);
    assert_eq!(manager.registered_plugins().count(), 10);
    assert_eq!(manager.extensions(&ep_a()).len(), 10);
}

#[tokio::test]
async fn malformed_plugins_register_nothing() {
    let tree = NodeModulesBuilder::new().with_export("half-valid", malformed_export());
    let mut manager = tree.manager();
    manager.register_extension_point(ep_a()).unwrap();
    manager.register_extension_point(ep_b()).unwrap();

    assert_eq!(manager.register_all_plugins().await.unwrap(), 0);
    assert!(manager.extensions(&ep_a()).is_empty());
}

#[tokio::test]
async fn url_manager_registers_by_name() {
    let loader = FIXTURE_MODULE_URLS
        .iter()
        .fold(plexus_plugins::StaticModuleLoader::new(), |loader, url| {
            loader.with_module(*url, plexus_plugins::ModuleExport::plugin(plugin_a()))
        });
    let mut manager = PluginManager::from_urls(FIXTURE_MODULE_URLS, Arc::new(loader)).unwrap();
    manager.register_extension_point(ep_a()).unwrap();

    assert_eq!(manager.registered_plugins().count(), 0);
    assert_eq!(manager.register_plugins_by_module_name("foo", None).await.unwrap(), 3);
    assert_eq!(manager.registered_plugins().count(), 3);
    assert!(
        manager
            .registered_plugin(&PluginId::from_static("https://foo.com/@barscope/foo"))
            .is_ok()
    );
}

#[cfg(feature = "config")]
#[tokio::test]
async fn manager_from_config_prefers_urls() {
    let loader = plexus_plugins::StaticModuleLoader::new().with_module(
        "https://cdn.test/@acme/widgets",
        plexus_plugins::ModuleExport::plugin(plugin_a()),
    );
    let config = plexus_config::DiscoveryConfig {
        search_paths: vec!["/does/not/exist".into()],
        module_urls: vec!["https://cdn.test/@acme/widgets".to_owned()],
        ..Default::default()
    };

    let mut manager = PluginManager::from_config(&config, Arc::new(loader)).unwrap();
    manager.register_extension_point(ep_a()).unwrap();
    assert_eq!(manager.register_all_plugins().await.unwrap(), 1);
}

#[cfg(feature = "config")]
#[tokio::test]
async fn manager_from_config_scans_search_paths() {
    let tree = NodeModulesBuilder::new().with_fixture_tree();
    let config = plexus_config::DiscoveryConfig {
        search_paths: vec![tree.root().to_path_buf()],
        max_concurrent_reads: Some(2),
        ..Default::default()
    };

    let mut manager = PluginManager::from_config(&config, Arc::new(tree.loader())).unwrap();
    manager.register_extension_point(ep_a()).unwrap();
    assert_eq!(manager.register_all_plugins().await.unwrap(), 10);
}
