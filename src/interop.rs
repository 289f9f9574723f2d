#![allow(missing_docs)]

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::actions::{find_action, get_actions, ActionResult};
use crate::providers::{get_providers, ProviderContext};
use crate::{format_message, speakable_text, AtaBotConfig, AtaBotPlugin, StoredConversation};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginManifest {
    pub name: String,
    pub description: String,
    pub version: String,
    pub language: String,
    pub interop_protocols: Vec<String>,
    pub actions: Vec<ActionManifest>,
    pub providers: Vec<ProviderManifest>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionManifest {
    pub name: String,
    pub description: String,
    pub similes: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderManifest {
    pub name: String,
    pub description: String,
}

impl Default for PluginManifest {
    fn default() -> Self {
        Self {
            name: crate::PLUGIN_NAME.to_string(),
            description: crate::PLUGIN_DESCRIPTION.to_string(),
            version: crate::PLUGIN_VERSION.to_string(),
            language: "rust".to_string(),
            interop_protocols: vec!["wasm".to_string(), "ipc".to_string()],
            actions: get_actions()
                .iter()
                .map(|action| ActionManifest {
                    name: action.name().to_string(),
                    description: action.description().to_string(),
                    similes: action.similes().iter().map(|s| s.to_string()).collect(),
                })
                .collect(),
            providers: get_providers()
                .iter()
                .map(|provider| ProviderManifest {
                    name: provider.name().to_string(),
                    description: provider.description().to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

pub fn get_manifest_json() -> String {
    serde_json::to_string(&PluginManifest::default())
        .unwrap_or_else(|e| format!(r#"{{"error": "{}"}}"#, e))
}

/// Builds a plugin from a JSON config. Empty, `null` and `{}` give the
/// defaults.
pub fn init_plugin(config_json: &str) -> crate::Result<AtaBotPlugin> {
    let trimmed = config_json.trim();
    let config = if trimmed.is_empty() || trimmed == "null" {
        AtaBotConfig::default()
    } else {
        serde_json::from_str::<AtaBotConfig>(trimmed)?
    };
    AtaBotPlugin::with_config(config)
}

pub fn validate_action(plugin: &AtaBotPlugin, name: &str, memory_json: &str) -> bool {
    match find_action(name) {
        Some(action) => action.validate(plugin, &extract_user_input(memory_json, "{}")),
        None => false,
    }
}

pub fn invoke_action(
    plugin: &AtaBotPlugin,
    name: &str,
    memory_json: &str,
    options_json: &str,
) -> ActionResult {
    let action = match find_action(name) {
        Some(action) => action,
        None => return ActionResult::failure(&format!("Unknown action: {}", name)),
    };

    let input = extract_user_input(memory_json, options_json);

    if input.trim().is_empty() {
        return ActionResult::failure("No user input provided");
    }

    action.handler(plugin, &input)
}

pub fn get_provider(plugin: &AtaBotPlugin, name: &str, state_json: &str) -> ProviderResult {
    let provider = match get_providers().into_iter().find(|p| p.name() == name) {
        Some(provider) => provider,
        None => return ProviderResult::default(),
    };

    let hour = serde_json::from_str::<Value>(state_json)
        .ok()
        .and_then(|state| state.get("hour").and_then(Value::as_u64))
        .and_then(|hour| u32::try_from(hour).ok())
        .filter(|hour| *hour < 24);

    let result = provider.get(plugin, &ProviderContext { hour });
    ProviderResult {
        text: Some(result.text),
        values: Some(result.values),
        data: Some(result.data),
    }
}

/// Pulls the user's text out of action options (`input`, `prompt`, `text`,
/// `action` or `id`) or, failing that, out of `memory.content.text`.
pub fn extract_user_input(memory_json: &str, options_json: &str) -> String {
    if let Ok(options) = serde_json::from_str::<Value>(options_json) {
        for key in ["input", "prompt", "text", "action", "id"] {
            if let Some(value) = options.get(key).and_then(Value::as_str) {
                return value.to_string();
            }
        }
    }

    if let Ok(memory) = serde_json::from_str::<Value>(memory_json) {
        if let Some(text) = memory
            .get("content")
            .and_then(|content| content.get("text"))
            .and_then(Value::as_str)
        {
            return text.to_string();
        }
    }

    String::new()
}

#[cfg(feature = "wasm")]
pub mod wasm {
    use super::*;
    use wasm_bindgen::prelude::*;

    #[wasm_bindgen(start)]
    pub fn wasm_init() {
        console_error_panic_hook::set_once();
    }

    #[wasm_bindgen]
    pub fn get_manifest() -> String {
        get_manifest_json()
    }

    #[wasm_bindgen(js_name = formatMessage)]
    pub fn wasm_format_message(text: &str) -> String {
        format_message(text)
    }

    #[wasm_bindgen(js_name = speakableText)]
    pub fn wasm_speakable_text(text: &str) -> String {
        speakable_text(text)
    }

    /// One conversation, owned by the JavaScript side.
    #[wasm_bindgen]
    pub struct WasmAtaBot {
        plugin: AtaBotPlugin,
    }

    #[wasm_bindgen]
    impl WasmAtaBot {
        #[wasm_bindgen(constructor)]
        pub fn new(config_json: &str) -> Result<WasmAtaBot, JsValue> {
            let plugin = init_plugin(config_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
            Ok(WasmAtaBot { plugin })
        }

        /// Reply as JSON: `{category, text, trigger?}`.
        pub fn respond(&self, input: &str) -> String {
            serde_json::to_string(&self.plugin.respond(input))
                .unwrap_or_else(|e| format!(r#"{{"error": "{}"}}"#, e))
        }

        pub fn greeting(&self, hour: Option<u32>) -> String {
            match hour {
                Some(hour) => self.plugin.greeting_at(hour),
                None => self.plugin.get_greeting(),
            }
        }

        pub fn welcome(&self) -> String {
            self.plugin.welcome_message().to_string()
        }

        /// Quick action reply as JSON, or `null` for an unknown id.
        pub fn quick_reply(&self, id: &str) -> String {
            match self.plugin.quick_reply(id) {
                Some(exchange) => {
                    serde_json::to_string(&exchange).unwrap_or_else(|_| "null".to_string())
                }
                None => "null".to_string(),
            }
        }

        pub fn typing_delay_ms(&self) -> u32 {
            u32::try_from(self.plugin.typing_delay().as_millis()).unwrap_or(u32::MAX)
        }

        pub fn clear(&self) -> String {
            self.plugin.reset_history()
        }

        pub fn history_json(&self) -> String {
            serde_json::to_string(&self.plugin.snapshot()).unwrap_or_else(|_| "{}".to_string())
        }

        pub fn restore_history(&self, json: &str) -> Result<(), JsValue> {
            let saved: StoredConversation =
                serde_json::from_str(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
            self.plugin.restore_history(saved);
            Ok(())
        }

        pub fn invoke_action(&self, name: &str, memory_json: &str, options_json: &str) -> String {
            let result = invoke_action(&self.plugin, name, memory_json, options_json);
            serde_json::to_string(&result)
                .unwrap_or_else(|e| format!(r#"{{"success": false, "error": "{}"}}"#, e))
        }

        pub fn get_provider(&self, name: &str, state_json: &str) -> String {
            let result = get_provider(&self.plugin, name, state_json);
            serde_json::to_string(&result).unwrap_or_else(|_| "{}".to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpcRequest {
    pub id: u64,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IpcResponse {
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IpcResponse {
    pub fn success(id: u64, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: u64, error: &str) -> Self {
        Self {
            id,
            result: None,
            error: Some(error.to_string()),
        }
    }

    fn from_serialize<T: Serialize>(id: u64, value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(result) => Self::success(id, result),
            Err(e) => Self::error(id, &e.to_string()),
        }
    }
}

fn str_param<'a>(params: &'a Value, key: &str) -> &'a str {
    params.get(key).and_then(Value::as_str).unwrap_or("")
}

fn json_param(params: &Value, key: &str, default: &str) -> String {
    params
        .get(key)
        .map(|v| v.to_string())
        .unwrap_or_else(|| default.to_string())
}

/// Dispatches one request against `plugin`. `init` replaces the plugin.
pub fn handle_ipc_request(plugin: &mut AtaBotPlugin, request: &IpcRequest) -> IpcResponse {
    let params = &request.params;
    match request.method.as_str() {
        "getManifest" => IpcResponse::from_serialize(request.id, &PluginManifest::default()),
        "init" => {
            let config = json_param(params, "config", "{}");
            match init_plugin(&config) {
                Ok(fresh) => {
                    *plugin = fresh;
                    IpcResponse::success(request.id, serde_json::json!({"initialized": true}))
                }
                Err(e) => IpcResponse::error(request.id, &e.to_string()),
            }
        }
        "validateAction" => {
            let memory = json_param(params, "memory", "");
            let valid = validate_action(plugin, str_param(params, "name"), &memory);
            IpcResponse::success(request.id, serde_json::json!({"valid": valid}))
        }
        "invokeAction" => {
            let memory = json_param(params, "memory", "");
            let options = json_param(params, "options", "{}");
            let result = invoke_action(plugin, str_param(params, "name"), &memory, &options);
            IpcResponse::from_serialize(request.id, &result)
        }
        "getProvider" => {
            let state = json_param(params, "state", "{}");
            let result = get_provider(plugin, str_param(params, "name"), &state);
            IpcResponse::from_serialize(request.id, &result)
        }
        "generateResponse" => {
            let selection = plugin.respond(str_param(params, "input"));
            let delay = plugin.typing_delay();
            IpcResponse::success(
                request.id,
                serde_json::json!({
                    "response": selection.text,
                    "category": selection.category,
                    "trigger": selection.trigger,
                    "typingDelayMs": delay.as_millis() as u64,
                }),
            )
        }
        "quickAction" => {
            let id = str_param(params, "id");
            match plugin.quick_reply(id) {
                Some(exchange) => IpcResponse::from_serialize(request.id, &exchange),
                None => IpcResponse::error(request.id, &format!("Unknown quick action: {}", id)),
            }
        }
        "clearConversation" => {
            let message = plugin.reset_history();
            IpcResponse::success(request.id, serde_json::json!({"message": message}))
        }
        "getHistory" => IpcResponse::from_serialize(request.id, &plugin.snapshot()),
        "restoreHistory" => {
            let conversation = params.get("conversation").cloned().unwrap_or(Value::Null);
            match serde_json::from_value::<StoredConversation>(conversation) {
                Ok(saved) => {
                    plugin.restore_history(saved);
                    IpcResponse::success(request.id, serde_json::json!({"restored": true}))
                }
                Err(e) => IpcResponse::error(request.id, &format!("Invalid conversation: {}", e)),
            }
        }
        "formatMessage" => {
            let text = str_param(params, "text");
            IpcResponse::success(
                request.id,
                serde_json::json!({
                    "html": format_message(text),
                    "speakable": speakable_text(text),
                }),
            )
        }
        _ => IpcResponse::error(request.id, &format!("Unknown method: {}", request.method)),
    }
}
