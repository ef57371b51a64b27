use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub fn setters_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("list-setters"));
	cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
	cmd
}

pub const KPTFILE: &str = r#"apiVersion: kpt.dev/v1
kind: Kptfile
metadata:
  name: nginx
pipeline:
  mutators:
    - image: gcr.io/kpt-fn/apply-setters:v0.2
      configMap:
        replicas: "4"
        tier: backend
"#;

pub const DEPLOYMENT: &str = r"apiVersion: apps/v1
kind: Deployment
metadata:
  name: nginx-deployment # kpt-set: ${name}-deployment
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
