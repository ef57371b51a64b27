use crate::DiscoveryResult;
use crate::Document;
use crate::SetterType;
use crate::SettersResult;
use crate::parse_documents;

pub const DEPLOYMENT: &str = r"apiVersion: apps/v1
kind: Deployment
metadata:
  name: nginx-deployment # kpt-set: ${name}-deployment
  labels:
    app: my-app # kpt-set: ${app}
spec:
  replicas: 4 # kpt-set: ${replicas}
  template:
    spec:
      containers:
        - name: nginx
          image: nginx:1.7.9 # kpt-set: ${image}:${tag}
          args: # kpt-set: ${args}
            - --verbose
            - --debug
";

pub const RESOURCES: &str = r"apiVersion: v1
kind: Service
metadata:
  name: nginx-service # kpt-set: ${name}-service
spec:
  selector:
    app: my-app # kpt-set: ${app}
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: env-config
data:
  environments: [dev, stage, prod] # kpt-set: ${environments}
";

pub const KPTFILE_INLINE: &str = r#"apiVersion: kpt.dev/v1
kind: Kptfile
metadata:
  name: nginx
pipeline:
  mutators:
    - image: gcr.io/kpt-fn/set-labels:v0.1
      configMap:
        app: ignored
    - image: gcr.io/kpt-fn/apply-setters:v0.2
      configMap:
        replicas: "4"
        tier: backend
        regions: "[us-east1, us-west1]"
"#;

pub const KPTFILE_CONFIG_PATH: &str = r"apiVersion: kpt.dev/v1
kind: Kptfile
metadata:
  name: nginx
pipeline:
  mutators:
    - image: gcr.io/kpt-fn/apply-setters:v0.2
      configPath: setters.yaml
";

pub const SETTERS_CONFIG: &str = r"apiVersion: v1
kind: ConfigMap
metadata:
  name: setters
  annotations:
    config.kubernetes.io/local-config: 'true'
data:
  replicas: '4'
  zones:
    - us-east1-b
    - us-east1-a
";

pub const KPTFILE_WITHOUT_PIPELINE: &str = r"apiVersion: kpt.dev/v1
kind: Kptfile
metadata:
  name: nginx
";

pub const KPTFILE_WITHOUT_APPLY_SETTERS: &str = r"apiVersion: kpt.dev/v1
kind: Kptfile
metadata:
  name: nginx
pipeline:
  mutators:
    - image: gcr.io/kpt-fn/set-namespace:v0.4
      configMap:
        namespace: example
  validators:
    - image: gcr.io/kpt-fn/apply-setters:v0.2
      configMap:
        replicas: '1'
";

pub const KPTFILE_WITHOUT_CONFIG: &str = r"apiVersion: kpt.dev/v1
kind: Kptfile
metadata:
  name: nginx
pipeline:
  mutators:
    - image: gcr.io/kpt-fn/apply-setters:v0.2
";

/// Parse `content` as the file `path`.
pub fn documents(path: &str, content: &str) -> SettersResult<Vec<Document>> {
	parse_documents(content, Some(path))
}

/// Parse several files into one document list, in the order given.
pub fn package(files: &[(&str, &str)]) -> SettersResult<Vec<Document>> {
	let mut all = Vec::new();
	for (path, content) in files {
		all.extend(documents(path, content)?);
	}
	Ok(all)
}

/// Write `files` below `root`, creating parent directories as needed.
pub fn write_files(root: &std::path::Path, files: &[(&str, &str)]) {
	for (path, content) in files {
		let target = root.join(path);
		if let Some(parent) = target.parent() {
			std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("create_dir_all: {e}"));
		}
		std::fs::write(&target, content).unwrap_or_else(|e| panic!("write: {e}"));
	}
}

pub fn string_setter(name: &str, value: &str, count: usize) -> DiscoveryResult {
	DiscoveryResult {
		name: name.to_string(),
		value: value.to_string(),
		r#type: SetterType::String,
		count,
	}
}

pub fn list_setter(name: &str, value: &str, count: usize) -> DiscoveryResult {
	DiscoveryResult {
		name: name.to_string(),
		value: value.to_string(),
		r#type: SetterType::List,
		count,
	}
}
