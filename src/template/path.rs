use serde_json::{Map, Value};

/// Read a nested value addressed by an underscore-delimited path.
/// Any missing segment yields `None`.
pub fn get_template_value<'a>(template: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('_').try_fold(template, |node, part| node.get(part))
}

/// Write a nested value addressed by an underscore-delimited path, creating
/// intermediate objects as needed. A non-object found on the way is
/// replaced by an object.
pub fn set_template_value(template: &mut Value, path: &str, value: Value) {
    let mut node = template;
    for part in path.split('_') {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        node = &mut node[part];
    }
    *node = value;
}
