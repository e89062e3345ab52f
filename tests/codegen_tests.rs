use bluec::{CompileError, generate_assembly};

fn assemble(source: &str) -> String {
  generate_assembly(source).expect("compilation should succeed")
}

#[test]
fn empty_program_is_prologue_plus_default_exit() {
  assert_eq!(
    assemble(""),
    "global _start\n\
     _start:\n\
     \x20   mov rax, 60\n\
     \x20   mov rdi, 0\n\
     \x20   syscall\n"
  );
}

#[test]
fn exit_pops_the_status_into_rdi() {
  let asm = assemble("exit(0);");
  assert!(asm.contains(
    "    mov rax, 0\n\
     \x20   push rax\n\
     \x20   mov rax, 60\n\
     \x20   pop rdi\n\
     \x20   syscall\n"
  ));
}

#[test]
fn binary_operands_are_emitted_rhs_first() {
  // `7 - 3` must become rax - rbx with rax = 7: the RHS is pushed first so
  // the LHS ends up on top for the first pop.
  let asm = assemble("exit(7 - 3);");
  assert!(asm.contains(
    "    mov rax, 3\n\
     \x20   push rax\n\
     \x20   mov rax, 7\n\
     \x20   push rax\n\
     \x20   pop rax\n\
     \x20   pop rbx\n\
     \x20   sub rax, rbx\n\
     \x20   push rax\n"
  ));
}

#[test]
fn precedence_drives_emission_order() {
  // 2 + 3 * 4: the product is a subtree, so its slots appear first.
  let asm = assemble("let x = 2 + 3 * 4; exit(x);");
  let mul = asm.find("mul rbx").expect("product emitted");
  let add = asm.find("add rax, rbx").expect("sum emitted");
  assert!(mul < add);
  assert!(asm.contains("    push QWORD [rsp + 0]\n"));
}

#[test]
fn modulo_takes_the_remainder_from_rdx() {
  let asm = assemble("exit(10 % 3);");
  assert!(asm.contains(
    "    xor rdx, rdx\n\
     \x20   div rbx\n\
     \x20   mov rax, rdx\n"
  ));
}

#[test]
fn division_emits_plain_div() {
  let asm = assemble("exit(8 / 2);");
  assert!(asm.contains("    div rbx\n"));
  assert!(!asm.contains("idiv"));
}

#[test]
fn division_by_literal_zero_still_compiles() {
  // The trap is a runtime affair; the compiler's job ends at emission.
  assert!(generate_assembly("exit(1 / 0);").is_ok());
}

#[test]
fn char_literals_emit_their_code_point() {
  assert!(assemble("exit('a');").contains("    mov rax, 97\n"));
  assert!(assemble("exit('');").contains("    mov rax, 0\n"));
}

#[test]
fn inner_shadow_resolves_to_the_top_slot() {
  // Inside the scope both `a`s are live; the reference must pick the inner
  // one, which sits on top of the stack.
  let asm = assemble("let a = 1; { let a = 2; exit(a); }");
  assert!(asm.contains("    push QWORD [rsp + 0]\n"));
}

#[test]
fn scope_exit_drops_local_slots() {
  let asm = assemble("let a = 1; { let a = 2; } exit(a);");
  let drop_pos = asm.find("add rsp, 8").expect("scope teardown emitted");
  let read_pos = asm.find("push QWORD [rsp + 0]").expect("outer read emitted");
  assert!(drop_pos < read_pos);
}

#[test]
fn scope_exit_drops_all_locals_at_once() {
  let asm = assemble("{ let a = 1; let b = 2; }");
  assert!(asm.contains("    add rsp, 16\n"));
}

#[test]
fn empty_scope_emits_nothing() {
  assert_eq!(assemble("{}"), assemble(""));
}

#[test]
fn noop_identifier_statement_emits_nothing() {
  assert_eq!(
    assemble("let x = 1; x; exit(x);"),
    assemble("let x = 1; exit(x);")
  );
}

#[test]
fn if_with_else_uses_end_and_false_labels() {
  let asm = assemble("if (1) { exit(7); } else { exit(9); }");
  assert!(asm.contains("    jz label1\n"));
  assert!(asm.contains("    jmp label0\n"));
  assert!(asm.contains("label1:\n"));
  assert!(asm.contains("label0:\n"));
}

#[test]
fn if_without_tail_needs_only_the_false_label() {
  let asm = assemble("if (1) { exit(2); }");
  assert!(asm.contains("    jz label0\n"));
  assert!(asm.contains("label0:\n"));
  assert!(!asm.contains("jmp"));
}

#[test]
fn elif_chain_shares_one_end_label() {
  let asm = assemble("if (0) { exit(1); } elif (1) { exit(2); } else { exit(3); }");
  assert!(asm.contains("    jz label1\n"));
  assert!(asm.contains("    jz label2\n"));
  assert_eq!(asm.matches("    jmp label0\n").count(), 2);
  assert_eq!(asm.matches("label0:\n").count(), 1);
}

#[test]
fn condition_test_precedes_the_branch() {
  let asm = assemble("if (1) { exit(2); }");
  assert!(asm.contains(
    "    pop rax\n\
     \x20   test rax, rax\n\
     \x20   jz label0\n"
  ));
}

#[test]
fn assignment_writes_the_resolved_slot() {
  let asm = assemble("let x = 1; x = 5; exit(x);");
  assert!(asm.contains("    mov [rsp + 0], rax\n"));
}

#[test]
fn program_ends_with_default_exit() {
  let asm = assemble("let x = 1;");
  assert!(asm.ends_with(
    "    mov rax, 60\n\
     \x20   mov rdi, 0\n\
     \x20   syscall\n"
  ));
}

#[test]
fn undeclared_identifier_is_rejected() {
  let err = generate_assembly("exit(x);").expect_err("codegen should fail");
  assert_eq!(err.to_string(), "Undeclared identifier: x");
}

#[test]
fn undeclared_assignment_target_is_rejected() {
  let err = generate_assembly("y = 1;").expect_err("codegen should fail");
  assert_eq!(err.to_string(), "Undeclared identifier: y");
}

#[test]
fn redeclaration_in_the_same_scope_is_rejected() {
  let err = generate_assembly("let x = 1; let x = 2;").expect_err("codegen should fail");
  assert_eq!(err.to_string(), "Identifier already used: x");
}

#[test]
fn shadowing_in_an_inner_scope_is_allowed() {
  assert!(generate_assembly("let x = 1; { let x = 2; }").is_ok());
}

#[test]
fn redeclaration_after_scope_exit_is_allowed() {
  assert!(generate_assembly("{ let x = 1; } let x = 2;").is_ok());
}

#[test]
fn print_is_not_implemented() {
  let err = generate_assembly("print(1);").expect_err("codegen should fail");
  assert!(matches!(err, CompileError::NotImplemented { .. }));
}

#[test]
fn function_definitions_are_not_implemented() {
  let err = generate_assembly("function f() { exit(1); }").expect_err("codegen should fail");
  assert!(matches!(err, CompileError::NotImplemented { .. }));
}

#[test]
fn function_calls_are_not_implemented() {
  let err = generate_assembly("f();").expect_err("codegen should fail");
  assert!(matches!(err, CompileError::NotImplemented { .. }));
}

#[test]
fn float_literals_are_rejected_with_a_diagnostic() {
  let err = generate_assembly("exit(1.5);").expect_err("codegen should fail");
  assert!(matches!(err, CompileError::NotImplemented { .. }));
  assert!(err.to_string().contains("float"));
}
