mod common;
use common::{cli, meta_lines, records, Fixture};

use anyhow::Result;
#[cfg(test)] use pretty_assertions::assert_eq;

const KEPT_100: &str = "seq1\t100\t.\tA\tT\t50\tPASS\tDP=30\tGT\t0/1\t0/0\t0/0\t1/1\t1/1\t1/1\t0/1\t0/0";
const KEPT_200: &str = "seq1\t200\t.\tC\tG\t50\tPASS\tDP=30\tGT\t0/1\t0/0\t0/0\t1/1\t1/1\t./.\t0/0\t1/1";
const KEPT_SEQ2: &str = "seq2\t100\t.\tA\tG\t50\tPASS\tDP=30\tGT\t0/0\t0/1\t0/0\t1/1\t0/1\t1/1\t0/1\t0/0";

/// Sample `B3` is the only one missing within the dataset.
const B3_COLUMN: usize = 14;

fn path(p: &std::path::Path) -> &str {
    p.to_str().expect("Invalid path (non UTF8 characters ?)")
}

fn pipeline_args(fixture: &Fixture) -> Vec<String> {
    let vcf = fixture.file("hybrid.vcf");
    let ped = fixture.file("hybrid.ped");
    let out = fixture.output_dir();
    ["pipeline", "-i", path(&vcf), "-o", path(&out), "-p", path(&ped), "--sp1", "sp1", "--sp2", "sp2"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn run(args: &[String]) -> Result<()> {
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    hybrid_impute::run(cli(&args))
}

/// The imputed call of B3 must be a called biallelic genotype, every other call is left untouched.
fn assert_b3_imputed(record: &str) {
    let mut fields: Vec<&str> = record.split('\t').collect();
    assert!(["0/0", "0/1", "1/1"].contains(&fields[B3_COLUMN]), "{record}");
    fields[B3_COLUMN] = "./.";
    assert_eq!(fields.join("\t"), KEPT_200);
}

#[test]
fn pipeline_end_to_end() -> Result<()> {
    let fixture = Fixture::copy("pipeline");
    run(&pipeline_args(&fixture))?;

    // ---- Adult imputation: monomorphic and poorly covered variants are removed, along with unused contigs.
    let adult = fixture.output("hybrid.adult.vcf");
    assert_eq!(records(&adult), [KEPT_100, KEPT_200, KEPT_SEQ2]);
    let contigs: Vec<String> = meta_lines(&adult).into_iter().filter(|line| line.starts_with("##contig")).collect();
    assert_eq!(contigs, ["##contig=<ID=seq1,length=1000>", "##contig=<ID=seq2,length=1000>"]);

    // ---- Genotype data: every SNP is polymorphic, 8 samples yield 28 kinship pairs.
    let snps = std::fs::read_to_string(fixture.output("hybrid.snps.tsv"))?;
    assert_eq!(snps.lines().count(), 1 + 3);
    let kinship = std::fs::read_to_string(fixture.output("hybrid.kinship.tsv"))?;
    assert_eq!(kinship.lines().count(), 1 + 28);
    assert!(fixture.output("hybrid.ld.tsv").exists());

    // ---- SOM and progeny imputation. Variant order is preserved.
    for step in ["som", "progeny"] {
        let body = records(&fixture.output(&format!("hybrid.{step}.vcf")));
        assert_eq!(body.len(), 3);
        assert_eq!(body[0], KEPT_100);
        assert_b3_imputed(&body[1]);
        assert_eq!(body[2], KEPT_SEQ2);
    }
    Ok(())
}

#[test]
fn outputs_are_never_overwritten_by_default() -> Result<()> {
    let fixture = Fixture::copy("pipeline");
    let mut args = pipeline_args(&fixture);
    run(&args)?;
    assert!(run(&args).is_err());

    args.push("--overwrite".to_string());
    run(&args)?;
    Ok(())
}

#[test]
fn step_by_step() -> Result<()> {
    let fixture = Fixture::copy("pipeline");
    let (vcf, ped, out) = (fixture.file("hybrid.vcf"), fixture.file("hybrid.ped"), fixture.output_dir());
    let (vcf, ped, out) = (path(&vcf), path(&ped), path(&out));

    run(&["adult-impute", "-i", vcf, "-o", out, "-p", ped, "--sp1", "sp1", "--sp2", "sp2"].map(String::from))?;
    let adult = fixture.output("hybrid.adult.vcf");
    run(&["genotype-data", "-i", path(&adult), "-o", out].map(String::from))?;
    assert!(fixture.output("hybrid.adult.snps.tsv").exists());

    // Tables are looked for within the output directory by default.
    run(&["som-impute", "-i", path(&adult), "-o", out, "--method", "ck"].map(String::from))?;
    let body = records(&fixture.output("hybrid.adult.som.vcf"));
    assert_b3_imputed(&body[1]);

    // ...or explicitly provided.
    let tables = fixture.output("hybrid.adult");
    run(&["som-impute", "-i", path(&adult), "-o", out, "--tables", path(&tables), "-w"].map(String::from))?;
    assert_eq!(records(&fixture.output("hybrid.adult.som.vcf")), body);
    Ok(())
}

#[test]
fn som_impute_requires_tables() {
    let fixture = Fixture::copy("pipeline");
    let (vcf, out) = (fixture.file("hybrid.vcf"), fixture.output_dir());
    assert!(run(&["som-impute", "-i", path(&vcf), "-o", path(&out)].map(String::from)).is_err());
}

#[test]
fn replay_from_yaml() -> Result<()> {
    let fixture = Fixture::copy("pipeline");
    let mut args = pipeline_args(&fixture);
    args.push("-w".to_string());
    let first = cli(&args.iter().map(String::as_str).collect::<Vec<_>>());
    let yaml = first.serialize()?.expect("pipeline writes within an output directory");
    hybrid_impute::run(first)?;
    let expected = records(&fixture.output("hybrid.progeny.vcf"));

    std::fs::remove_file(fixture.output("hybrid.progeny.vcf"))?;
    run(&["from-yaml".to_string(), path(&yaml).to_string()])?;
    assert_eq!(records(&fixture.output("hybrid.progeny.vcf")), expected);
    Ok(())
}
