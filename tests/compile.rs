//! End-to-end compilation and evaluation scenarios.

use axon::{CompileOptions, Compiler, Instruction, Program, Vector, Word};

fn compile(script: &str) -> Program {
    let mut compiler = Compiler::with_builtins();
    compiler.add_source_script(script).unwrap();
    compiler.compile().unwrap()
}

fn eval(program: &Program, inputs: &[(&str, f64)], output: &str) -> f64 {
    let mut executable = program.scalar_executable();
    for &(name, value) in inputs {
        executable.set(program.input_address(name).unwrap(), value);
    }
    executable.run();
    executable.get(program.output_address(output).unwrap())
}

#[test]
fn increment_compiles_to_a_single_immediate_add() {
    let program = compile("input x\noutput y = x + 1\n");
    let x = program.input_address("x").unwrap();
    assert_eq!(
        program.instructions().code(),
        &[Instruction::AddImm { imm: 1.0, rhs: x }]
    );
    assert_eq!(eval(&program, &[("x", 2.0)], "y"), 3.0);
}

#[test]
fn self_cancellation_compiles_to_the_zero_constant() {
    let program = compile("input x\noutput y = x - x\n");
    assert!(program.instructions().code().is_empty());
    let y = program.output_address("y").unwrap();
    let constants = program.constants();
    assert!(y >= constants.offset());
    assert_eq!(constants.values()[(y - constants.offset()) as usize], 0.0);
    // The input is unused after reduction and aliases the scratch-pad.
    assert_eq!(
        program.input_address("x"),
        Some(Program::SCRATCHPAD_ADDRESS)
    );
    assert_eq!(eval(&program, &[("x", 7.25)], "y"), 0.0);
}

#[test]
fn like_terms_reduce_to_a_short_chain() {
    let program = compile("input x\noutput y = (2*x + 3*x) - x\n");
    assert_eq!(eval(&program, &[("x", 5.0)], "y"), 20.0);
    assert_eq!(eval(&program, &[("x", -1.5)], "y"), -6.0);
}

#[test]
fn fifth_power_compiles_to_three_multiplications() {
    let program = compile("input x\noutput y = x^5\n");
    let code = program.instructions().code();
    assert_eq!(code.len(), 3, "{code:?}");
    assert!(code
        .iter()
        .all(|instruction| matches!(instruction, Instruction::Mul { .. })));
    assert_eq!(eval(&program, &[("x", 2.0)], "y"), 32.0);
}

#[test]
fn pythagorean_identity_compiles_to_the_one_constant() {
    let program = compile("input theta\noutput a = sin(theta)^2 + cos(theta)^2\n");
    assert!(program.instructions().code().is_empty());
    let a = program.output_address("a").unwrap();
    let constants = program.constants();
    assert!(a >= constants.offset());
    assert_eq!(constants.values()[(a - constants.offset()) as usize], 1.0);
    assert_eq!(eval(&program, &[("theta", 0.37)], "a"), 1.0);
}

#[test]
fn sin_cos_pairs_fuse_into_sincos() {
    let program = compile("input x\noutput s = sin(x)\noutput c = cos(x)\n");
    let code = program.instructions().code();
    let sincos: Vec<_> = code
        .iter()
        .enumerate()
        .filter_map(|(index, instruction)| match *instruction {
            Instruction::SinCos { arg, cos_offset } => Some((index, arg, cos_offset)),
            _ => None,
        })
        .collect();
    assert_eq!(sincos.len(), 1, "{code:?}");
    assert!(
        !code
            .iter()
            .any(|instruction| matches!(instruction, Instruction::Call { .. })),
        "{code:?}"
    );
    let (index, arg, cos_offset) = sincos[0];
    assert_eq!(arg, program.input_address("x").unwrap());
    let nop_index = (index as i32 + cos_offset) as usize;
    assert!(matches!(code[nop_index], Instruction::Nop));
    assert_eq!(
        program.output_address("c").unwrap(),
        program.instructions().offset() + nop_index as u32
    );

    let theta = 0.3;
    assert_eq!(eval(&program, &[("x", theta)], "s"), theta.sin());
    assert_eq!(eval(&program, &[("x", theta)], "c"), theta.cos());
}

#[test]
fn memory_map_invariants_hold() {
    let program = compile(
        "input x\n\
         input unused\n\
         const half = 0.5\n\
         output y = half * x + 2.5\n\
         output z = x^2.5\n",
    );
    let constants = program.constants();
    let code_offset = program.instructions().offset();
    assert!(constants.offset() > Program::SCRATCHPAD_ADDRESS);
    assert!(constants.offset() + constants.values().len() as u32 <= code_offset);
    for (name, &address) in program.inputs() {
        assert!(address < code_offset, "input '{name}' at {address}");
        let in_constants = address >= constants.offset()
            && address < constants.offset() + constants.values().len() as u32;
        assert!(!in_constants, "input '{name}' inside constants");
    }
    for &address in program.outputs().values() {
        assert_ne!(address, Program::SCRATCHPAD_ADDRESS);
    }
    assert_eq!(
        program.input_address("unused"),
        Some(Program::SCRATCHPAD_ADDRESS)
    );
    assert_eq!(eval(&program, &[("x", 3.0)], "y"), 4.0);
    let z = eval(&program, &[("x", 4.0)], "z");
    assert!((z - 32.0).abs() < 1e-9, "4^2.5 = {z}");
}

#[test]
fn symbolic_bindings_substitute_into_outputs() {
    let program = compile(
        "input x\n\
         a = x + 1\n\
         output y = a * a\n",
    );
    assert!(program.output_address("a").is_none());
    assert_eq!(eval(&program, &[("x", 2.0)], "y"), 9.0);
}

#[test]
fn parameters_inline_their_registration_value() {
    let mut compiler = Compiler::with_builtins();
    compiler.add_variable("x").unwrap();
    compiler.add_parameter("gain", 3.0).unwrap();
    compiler
        .add_expression("y", "gain * x", axon::Visibility::Public)
        .unwrap();
    let program = compiler.compile().unwrap();
    assert_eq!(eval(&program, &[("x", 2.0)], "y"), 6.0);

    compiler.set_parameter("gain", 5.0).unwrap();
    let program = compiler.compile().unwrap();
    assert_eq!(eval(&program, &[("x", 2.0)], "y"), 10.0);
}

#[test]
fn options_rename_and_lower_sin_cos() {
    let mut compiler = Compiler::with_builtins();
    compiler.set_options(
        CompileOptions::default()
            .lower_sin_cos(true)
            .rename("x", "alpha")
            .rename("y", "beta"),
    );
    compiler
        .add_source_script("input x\noutput y = sin(x)\n")
        .unwrap();
    let program = compiler.compile().unwrap();

    let alpha = program.input_address("alpha").unwrap();
    let beta = program.output_address("beta").unwrap();
    assert_eq!(
        program.instructions().code(),
        &[Instruction::Sin { arg: alpha }]
    );

    let mut executable = program.scalar_executable();
    executable.set(alpha, 0.4);
    executable.run();
    assert_eq!(executable.get(beta), 0.4f64.sin());
}

#[test]
fn vector_backend_matches_scalar_backend() {
    let program = compile(
        "input x\n\
         input y\n\
         output r = sin(x)*cos(y) + x^3 - y/x\n",
    );
    let x_addr = program.input_address("x").unwrap();
    let y_addr = program.input_address("y").unwrap();
    let r_addr = program.output_address("r").unwrap();

    let xs = [0.5, 1.0, 2.0, -3.0];
    let ys = [1.5, -0.25, 4.0, 0.75];

    let mut vector = program.vector_executable();
    vector.set(x_addr, Vector(xs));
    vector.set(y_addr, Vector(ys));
    vector.run();
    let bundled = vector.get(r_addr);

    for lane in 0..Vector::SIZE {
        let scalar = eval(&program, &[("x", xs[lane]), ("y", ys[lane])], "r");
        assert_eq!(bundled[lane], scalar, "lane {lane}");
    }
}

mod kerr {
    use super::*;

    const SOURCE: &str = "### Kerr Metric ###
#
# Inputs
input  t
input  r
input  phi
input  theta

# Parameters
param  M     = 1                       # mass
param  J     = 0.8                     # angular momentum
       a     = J/M                     # spin parameter
       r_s   = 2*M                     # Schwarzschild radius
       DELTA = r^2 - 2*M*r + a^2       # discriminant
       SIGMA = r^2 + a^2*cos(theta)^2

# Outputs
output g_00 = -(1-r_s*r/SIGMA)
output g_01 = 0
output g_02 = 0
output g_03 = -[r_s*r*a*sin(theta)^2]/SIGMA
output g_10 = 0
output g_11 = SIGMA/DELTA
output g_12 = 0
output g_13 = 0
output g_20 = 0
output g_21 = 0
output g_22 = SIGMA
output g_23 = 0
output g_30 = -a*[2*M*r]/[a^2*cos(theta)^2 + r^2]*sin(theta)^2    # same as \"g_03\" but written differently
output g_31 = 0
output g_32 = 0
output g_33 = (r^2 + a^2 + [r_s*r*a^2]/SIGMA*sin(theta)^2)*sin(theta)^2
";

    // The closed-form Boyer-Lindquist metric components.
    fn expected(r: f64, theta: f64) -> [[f64; 4]; 4] {
        let m = 1.0;
        let j = 0.8;
        let a = j / m;
        let r_s = 2.0 * m;
        let sigma = r * r + a * a * theta.cos() * theta.cos();
        let delta = r * r - 2.0 * m * r + a * a;
        let sin2 = theta.sin() * theta.sin();

        let mut g = [[0.0; 4]; 4];
        g[0][0] = -(1.0 - r_s * r / sigma);
        g[0][3] = -(r_s * r * a * sin2) / sigma;
        g[1][1] = sigma / delta;
        g[2][2] = sigma;
        g[3][0] = g[0][3];
        g[3][3] = (r * r + a * a + (r_s * r * a * a) / sigma * sin2) * sin2;
        g
    }

    #[test]
    fn compiles_with_all_sixteen_outputs() {
        let program = compile(SOURCE);
        assert_eq!(program.outputs().len(), 16);
        for j in 0..4 {
            for i in 0..4 {
                let name = format!("g_{j}{i}");
                assert!(
                    program.output_address(&name).is_some(),
                    "missing output {name}"
                );
            }
        }
        // `t` does not participate in any output.
        assert_eq!(
            program.input_address("t"),
            Some(Program::SCRATCHPAD_ADDRESS)
        );
    }

    #[test]
    fn matches_the_closed_form_metric() {
        let program = compile(SOURCE);
        let (r, theta) = (10.0, std::f64::consts::FRAC_PI_2);
        let expected = expected(r, theta);

        let mut executable = program.scalar_executable();
        executable.set(program.input_address("r").unwrap(), r);
        executable.set(program.input_address("phi").unwrap(), 0.0);
        executable.set(program.input_address("theta").unwrap(), theta);
        executable.run();

        for j in 0..4 {
            for i in 0..4 {
                let address = program.output_address(&format!("g_{j}{i}")).unwrap();
                let actual = executable.get(address);
                assert!(
                    (actual - expected[j][i]).abs() <= 1e-12,
                    "g_{j}{i}: {actual} vs {}",
                    expected[j][i]
                );
            }
        }
    }

    #[test]
    fn vector_backend_matches_the_closed_form_metric() {
        let program = compile(SOURCE);
        let theta = std::f64::consts::FRAC_PI_2;
        let radii = [4.0, 6.0, 8.0, 10.0];

        let mut executable = program.vector_executable();
        executable.set(program.input_address("r").unwrap(), Vector(radii));
        executable.set(program.input_address("phi").unwrap(), Vector::splat(0.0));
        executable.set(
            program.input_address("theta").unwrap(),
            Vector::splat(theta),
        );
        executable.run();

        for (lane, &r) in radii.iter().enumerate() {
            let expected = expected(r, theta);
            for j in 0..4 {
                for i in 0..4 {
                    let address = program.output_address(&format!("g_{j}{i}")).unwrap();
                    let actual = executable.get(address)[lane];
                    assert!(
                        (actual - expected[j][i]).abs() <= 1e-12,
                        "lane {lane} g_{j}{i}: {actual} vs {}",
                        expected[j][i]
                    );
                }
            }
        }
    }
}
