pub fn generate_starter_config() -> String {
    r#"# =============================================================================
# LOGSHIP CONFIGURATION
# =============================================================================
# Describes the device and, per component, the rotated log files that are
# ready to be batched for upload.
#
# Config file locations (in order of precedence):
#   1. Path specified via --config argument
#   2. ~/.config/logship/config.yml
#   3. /etc/logship/config.yml
#
# Values may reference an environment variable by writing $env followed by
# the variable name in braces.

device:
  # Thing name used in stream names. Defaults to the host name.
  # Any ':' is replaced with '+' in stream names.
  thing_name: my-thing
  region: us-east-1

components:
  - name: com.example.HelloWorld
    # 'user' or 'system'
    type: user
    # Structured records below this level are skipped:
    # trace, debug, info, warn, error
    min_level: info
    # A line matching this pattern starts a new record; other lines are
    # appended to the current one (stack traces).
    multiline_start: '^[^\s]+(\s+[^\s]+)*$'
    # Rotated files, oldest first. 'offset' is where the previous run stopped.
    files:
      - path: /greengrass/v2/logs/com.example.HelloWorld_2024_01_01_00_0.log
        offset: 0
      - path: /greengrass/v2/logs/com.example.HelloWorld_2024_01_01_01_0.log
        offset: 0

  - name: System
    type: system
    min_level: warn
    files:
      - path: /greengrass/v2/logs/greengrass_2024_01_01_00_0.log
"#
    .to_string()
}
