extern crate minic;
extern crate minic_errors;
extern crate minic_ir;

use minic::Platform;
use minic_errors::reporter::Severity;
use minic_errors::Reporter;


fn x86(source: &str) -> String {
    let reporter = Reporter::new();
    let listing = minic::compile_x86(source, Platform::Linux, reporter.clone())
        .expect("compilation failed");
    assert!(!reporter.has_errors());
    listing
}

fn arm(source: &str) -> String {
    let reporter = Reporter::new();
    let listing = minic::compile_arm(source, reporter.clone()).expect("compilation failed");
    assert!(!reporter.has_errors());
    listing
}

fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

/// Labels are the lines ending in `:` at column zero; each must appear
/// exactly once in a listing.
fn assert_unique_labels(listing: &str) {
    let mut seen = ::std::collections::HashSet::new();
    for line in listing.lines() {
        if !line.starts_with(char::is_whitespace) && line.ends_with(':') {
            assert!(seen.insert(line.to_string()), "duplicate label {}", line);
        }
    }
}

const SCENARIOS: [&'static str; 6] = [
    "int main(){ return 42; }",
    "int main(){ int a=3; int b=4; return a*b+2; }",
    "int main(){ int x=0; if (x==0) return 1; else return 2; }",
    "int add(int a, int b){ return a+b; } int main(){ return add(20, 22); }",
    "int main(){ int a=1; int b=0; if (a && (b||1)) return 7; return 0; }",
    "int main(){ putchar('H'); putchar('i'); return 0; }",
];

#[test]
fn every_scenario_compiles_for_both_targets() {
    for source in SCENARIOS.iter() {
        let x86 = x86(source);
        let arm = arm(source);
        assert!(x86.ends_with('\n'));
        assert!(arm.ends_with('\n'));
        assert_eq!(count(&x86, ".globl main"), 1, "in {}", source);
        assert_eq!(count(&arm, ".global main"), 1, "in {}", source);
        assert_unique_labels(&x86);
        assert_unique_labels(&arm);
    }
}

#[test]
fn compilation_is_deterministic() {
    for source in SCENARIOS.iter() {
        assert_eq!(x86(source), x86(source));
        assert_eq!(arm(source), arm(source));
    }
}

#[test]
fn every_scenario_produces_valid_ir() {
    for source in SCENARIOS.iter() {
        let reporter = Reporter::new();
        let ir = minic::build_ir(source, reporter).expect("build failed");
        assert!(minic_ir::validate_ir(&ir).is_ok(), "invalid ir for {}", source);
    }
}

#[test]
fn return_42_loads_the_constant() {
    let listing = x86(SCENARIOS[0]);
    assert!(listing.contains("\tmovl\t$42, %eax\n"));
    assert!(listing.contains("\tleave\n\tret\n"));
    assert!(listing.contains("\tsubq\t$16, %rsp\n"));

    let listing = arm(SCENARIOS[0]);
    assert!(listing.contains("\tmov\tw8, #42\n"));
    assert!(listing.contains("\tldr\tw0, [sp, #16]\n"));
    assert!(listing.contains("\tadd\tsp, sp, #32\n\tldp\tx29, x30, [sp], #16\n\tret\n"));
}

#[test]
fn arithmetic_scenario_addresses_every_slot() {
    // a, b, two reads, the product, the constant, and the sum: 7 slots
    let listing = x86(SCENARIOS[1]);
    assert!(listing.contains("\tsubq\t$32, %rsp\n"));
    assert!(listing.contains("-28(%rbp)"));
    assert!(listing.contains("\timull\t"));

    let listing = arm(SCENARIOS[1]);
    assert!(listing.contains("\tsub\tsp, sp, #80\n"));
    assert!(listing.contains("[sp, #64]"));
    assert!(listing.contains("\tmul\tw8, w8, w9\n"));
}

#[test]
fn if_else_emits_a_conditional_branch() {
    let listing = x86(SCENARIOS[2]);
    assert!(listing.contains("\tsete\t%al\n\tmovzbl\t%al, %eax\n"));
    assert!(listing.contains("\tcmpl\t$0, %eax\n"));
    assert!(listing.contains("\tje\tBB_"));
    assert!(listing.contains("\tjmp\tBB_"));

    let listing = arm(SCENARIOS[2]);
    assert!(listing.contains("\tcset\tw8, eq\n"));
    assert!(listing.contains("\tcbz\tw8, BB_"));
}

#[test]
fn call_scenario_uses_the_calling_convention() {
    let listing = x86(SCENARIOS[3]);
    // the caller moves both arguments into the first two ABI registers
    assert!(listing.contains(", %edi\n"));
    assert!(listing.contains(", %esi\n"));
    assert!(listing.contains("\tcall\tadd\n"));
    // the callee binds its parameters from the same registers
    assert!(listing.contains("\tmovl\t%edi, -4(%rbp)\n"));
    assert!(listing.contains("\tmovl\t%esi, -8(%rbp)\n"));
    assert_eq!(count(&listing, ".globl add"), 1);

    let listing = arm(SCENARIOS[3]);
    assert!(listing.contains("\tbl\tadd\n"));
    assert!(listing.contains("\tstr\tw0, [sp, #16]\n"));
    assert!(listing.contains("\tstr\tw1, [sp, #24]\n"));
}

#[test]
fn short_circuit_scenario_branches_through_local_labels() {
    let listing = x86(SCENARIOS[4]);
    assert!(listing.contains("label_main_5_true:"));
    assert!(listing.contains("label_main_6_false:"));
    assert!(listing.contains("label_main_6_end:"));

    let listing = arm(SCENARIOS[4]);
    assert!(listing.contains("\tcbnz\tw8, label_main_5_true\n"));
    assert!(listing.contains("\tcbz\tw8, label_main_6_false\n"));
}

#[test]
fn putchar_scenario_calls_the_builtin_with_character_codes() {
    let listing = x86(SCENARIOS[5]);
    assert!(listing.contains("\tmovl\t$72, %eax\n"));
    assert!(listing.contains("\tmovl\t$105, %eax\n"));
    assert_eq!(count(&listing, "\tcall\tputchar\n"), 2);

    let listing = arm(SCENARIOS[5]);
    assert!(listing.contains("\tmov\tw8, #72\n"));
    assert_eq!(count(&listing, "\tbl\tputchar\n"), 2);
}

#[test]
fn macos_listing_prefixes_main_and_externals() {
    let reporter = Reporter::new();
    let listing = minic::compile_x86(SCENARIOS[5], Platform::MacOs, reporter).unwrap();
    assert_eq!(count(&listing, ".globl _main"), 1);
    assert!(listing.contains("_main:"));
    assert_eq!(count(&listing, "\tcall\t_putchar\n"), 2);
    assert!(!listing.contains(".note.GNU-stack"));
    assert!(!listing.contains(".type"));
}

#[test]
fn syntax_errors_stop_the_pipeline() {
    let reporter = Reporter::new();
    let result = minic::compile_x86("int main() { return 1 }", Platform::Linux, reporter.clone());
    assert!(result.is_err());
    assert!(reporter.has_errors());
}

#[test]
fn semantic_errors_stop_the_pipeline() {
    let reporter = Reporter::new();
    let result = minic::compile_x86("int main() { return x; }", Platform::Linux, reporter.clone());
    assert!(result.is_err());
    assert!(reporter.has_errors());
}

#[test]
fn warnings_do_not_stop_the_pipeline() {
    let reporter = Reporter::new();
    let result = minic::compile_x86(
        "int main() { int unused = 1; return 0; }",
        Platform::Linux,
        reporter.clone(),
    );
    assert!(result.is_ok());
    assert!(!reporter.has_errors());
    let warnings = reporter
        .get_diagnostics()
        .into_iter()
        .filter(|d| d.severity == Severity::Warning)
        .count();
    assert_eq!(warnings, 1);
}

#[test]
fn chained_assignment_stores_through_the_chain() {
    let listing = x86("int main() { int a = 0; int b = 0; a = b = 3; return a; }");
    // the constant lands in its temporary, then in b, then in a
    assert!(listing.contains("\tmovl\t$3, %eax\n"));
    assert!(listing.contains("\tmovl\t%eax, -12(%rbp)\n"));
    assert!(listing.contains("\tmovl\t-12(%rbp), %eax\n\tmovl\t%eax, -8(%rbp)\n"));
    assert!(listing.contains("\tmovl\t-12(%rbp), %eax\n\tmovl\t%eax, -4(%rbp)\n"));
}

#[test]
fn division_uses_the_signed_idiom() {
    let listing = x86("int main() { int a = 7; int b = 2; return a / b; }");
    assert!(listing.contains("\tcltd\n\tidivl\t"));
    let listing = x86("int main() { int a = 7; int b = 2; return a % b; }");
    assert!(listing.contains("\tmovl\t%edx, "));

    let listing = arm("int main() { int a = 7; int b = 2; return a % b; }");
    assert!(listing.contains("\tsdiv\tw10, w8, w9\n\tmsub\tw8, w10, w9, w8\n"));
}

#[test]
fn every_function_gets_exactly_one_label() {
    let listing = x86(SCENARIOS[3]);
    assert_eq!(count(&listing, "\nadd:\n"), 1);
    assert_eq!(count(&listing, "\nmain:\n"), 1);
}
